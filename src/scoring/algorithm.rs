// Scoring formulas applied to a candidate's accumulated sums.
//
// Exactly one formula is chosen per scoring call. The enum is closed, so the
// kernel matches it exhaustively; the only place an unknown algorithm can
// appear is when parsing untyped input (a name, a wire code, or JSON), and
// that is rejected with `ScoringError::UnknownAlgorithm`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::accumulator::CandidateSums;
use crate::embedding::SourceEmbedding;
use crate::error::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringAlgorithm {
    /// `weighted / source_log_norm / ln(1 + squared)`
    LogCosineSimilarity,
    /// `weighted / source_l2_norm / sqrt(squared)`
    CosineSimilarity,
    /// `weighted / sqrt(squared)`. For comparing scores across sources whose
    /// norms are not commensurable.
    CosineSimilarityNoSourceEmbeddingNormalization,
    /// `weighted`, unnormalized.
    DotProduct,
}

impl ScoringAlgorithm {
    pub const ALL: [ScoringAlgorithm; 4] = [
        ScoringAlgorithm::LogCosineSimilarity,
        ScoringAlgorithm::CosineSimilarity,
        ScoringAlgorithm::CosineSimilarityNoSourceEmbeddingNormalization,
        ScoringAlgorithm::DotProduct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringAlgorithm::LogCosineSimilarity => "LogCosineSimilarity",
            ScoringAlgorithm::CosineSimilarity => "CosineSimilarity",
            ScoringAlgorithm::CosineSimilarityNoSourceEmbeddingNormalization => {
                "CosineSimilarityNoSourceEmbeddingNormalization"
            }
            ScoringAlgorithm::DotProduct => "DotProduct",
        }
    }

    /// Wire code used by the thrift config this enum mirrors.
    pub fn code(&self) -> i32 {
        match self {
            ScoringAlgorithm::LogCosineSimilarity => 1,
            ScoringAlgorithm::CosineSimilarity => 2,
            ScoringAlgorithm::CosineSimilarityNoSourceEmbeddingNormalization => 3,
            ScoringAlgorithm::DotProduct => 4,
        }
    }

    /// Final score for one candidate.
    ///
    /// A zero denominator (all-zero candidate weights, or an all-zero source
    /// embedding) scores 0.0 instead of NaN.
    pub fn score(&self, sums: CandidateSums, source: &SourceEmbedding) -> f64 {
        let CandidateSums {
            weighted_sum,
            squared_sum,
        } = sums;
        match self {
            ScoringAlgorithm::LogCosineSimilarity => divide(
                divide(weighted_sum, source.log_norm()),
                squared_sum.ln_1p(),
            ),
            ScoringAlgorithm::CosineSimilarity => divide(
                divide(weighted_sum, source.l2_norm()),
                squared_sum.sqrt(),
            ),
            ScoringAlgorithm::CosineSimilarityNoSourceEmbeddingNormalization => {
                divide(weighted_sum, squared_sum.sqrt())
            }
            ScoringAlgorithm::DotProduct => weighted_sum,
        }
    }
}

fn divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl fmt::Display for ScoringAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoringAlgorithm {
    type Err = ScoringError;

    /// Accepts the canonical name in any case, and snake/kebab-case spellings
    /// (`cosine_similarity`, `dot-product`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        ScoringAlgorithm::ALL
            .into_iter()
            .find(|a| a.as_str().to_ascii_lowercase() == folded)
            .ok_or_else(|| ScoringError::UnknownAlgorithm(s.to_string()))
    }
}

impl TryFrom<i32> for ScoringAlgorithm {
    type Error = ScoringError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        ScoringAlgorithm::ALL
            .into_iter()
            .find(|a| a.code() == code)
            .ok_or_else(|| ScoringError::UnknownAlgorithm(code.to_string()))
    }
}

impl Serialize for ScoringAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Either spelling that can show up in a JSON config.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAlgorithm {
    Name(String),
    Code(i32),
}

impl<'de> Deserialize<'de> for ScoringAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawAlgorithm::deserialize(deserializer)? {
            RawAlgorithm::Name(name) => name.parse(),
            RawAlgorithm::Code(code) => ScoringAlgorithm::try_from(code),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
