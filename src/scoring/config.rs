// Parameters for one scoring call, plus the fixed system ceilings.

use serde::{Deserialize, Serialize};

use super::algorithm::ScoringAlgorithm;
use crate::error::{Result, ScoringError};

/// Most results a single call ever returns.
pub const MAX_NUM_RESULTS_UPPER_BOUND: usize = 1000;

/// Max candidate age (hours, 20 years) at or above which the window has no
/// lower bound.
pub const MAX_TWEET_CANDIDATE_AGE_UPPER_BOUND: u32 = 175_200;

/// Built only through `new` (or deserialization, which calls it), so
/// `max_top_tweets_per_cluster` is always positive.
///
/// Field names accept the camelCase spelling of the thrift config as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoringConfig")]
pub struct ScoringConfig {
    algorithm: ScoringAlgorithm,
    max_top_tweets_per_cluster: usize,
    min_tweet_candidate_age_hours: u32,
    max_tweet_candidate_age_hours: u32,
}

#[derive(Deserialize)]
struct RawScoringConfig {
    #[serde(alias = "annAlgorithm")]
    algorithm: ScoringAlgorithm,
    #[serde(alias = "maxTopTweetsPerCluster")]
    max_top_tweets_per_cluster: usize,
    #[serde(default, alias = "minTweetCandidateAgeHours")]
    min_tweet_candidate_age_hours: u32,
    #[serde(alias = "maxTweetCandidateAgeHours")]
    max_tweet_candidate_age_hours: u32,
}

impl TryFrom<RawScoringConfig> for ScoringConfig {
    type Error = ScoringError;

    fn try_from(raw: RawScoringConfig) -> Result<Self> {
        ScoringConfig::new(
            raw.algorithm,
            raw.max_top_tweets_per_cluster,
            raw.min_tweet_candidate_age_hours,
            raw.max_tweet_candidate_age_hours,
        )
    }
}

impl ScoringConfig {
    pub fn new(
        algorithm: ScoringAlgorithm,
        max_top_tweets_per_cluster: usize,
        min_tweet_candidate_age_hours: u32,
        max_tweet_candidate_age_hours: u32,
    ) -> Result<Self> {
        if max_top_tweets_per_cluster == 0 {
            return Err(ScoringError::ZeroTopTweets);
        }
        Ok(Self {
            algorithm,
            max_top_tweets_per_cluster,
            min_tweet_candidate_age_hours,
            max_tweet_candidate_age_hours,
        })
    }

    pub fn algorithm(&self) -> ScoringAlgorithm {
        self.algorithm
    }

    /// How many of each cluster's strongest candidates to look at.
    pub fn max_top_tweets_per_cluster(&self) -> usize {
        self.max_top_tweets_per_cluster
    }

    pub fn min_tweet_candidate_age_hours(&self) -> u32 {
        self.min_tweet_candidate_age_hours
    }

    pub fn max_tweet_candidate_age_hours(&self) -> u32 {
        self.max_tweet_candidate_age_hours
    }

    /// True when the age window has no lower id bound.
    pub fn unbounded_max_age(&self) -> bool {
        self.max_tweet_candidate_age_hours >= MAX_TWEET_CANDIDATE_AGE_UPPER_BOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_top_tweets_rejected() {
        assert_eq!(
            ScoringConfig::new(ScoringAlgorithm::DotProduct, 0, 0, 24).unwrap_err(),
            ScoringError::ZeroTopTweets
        );
    }

    #[test]
    fn test_accessors_reflect_constructor() {
        let config = ScoringConfig::new(ScoringAlgorithm::LogCosineSimilarity, 7, 2, 48).unwrap();
        assert_eq!(config.algorithm(), ScoringAlgorithm::LogCosineSimilarity);
        assert_eq!(config.max_top_tweets_per_cluster(), 7);
        assert_eq!(config.min_tweet_candidate_age_hours(), 2);
        assert_eq!(config.max_tweet_candidate_age_hours(), 48);
    }

    #[test]
    fn test_unbounded_threshold() {
        let at = ScoringConfig::new(ScoringAlgorithm::DotProduct, 1, 0, 175_200).unwrap();
        let below = ScoringConfig::new(ScoringAlgorithm::DotProduct, 1, 0, 175_199).unwrap();
        assert!(at.unbounded_max_age());
        assert!(!below.unbounded_max_age());
    }

    #[test]
    fn test_deserialize_thrift_spelling() {
        let config: ScoringConfig = serde_json::from_str(
            r#"{
                "annAlgorithm": "CosineSimilarity",
                "maxTopTweetsPerCluster": 50,
                "minTweetCandidateAgeHours": 1,
                "maxTweetCandidateAgeHours": 24
            }"#,
        )
        .unwrap();
        assert_eq!(config.algorithm(), ScoringAlgorithm::CosineSimilarity);
        assert_eq!(config.max_top_tweets_per_cluster(), 50);
        assert_eq!(config.min_tweet_candidate_age_hours(), 1);
        assert_eq!(config.max_tweet_candidate_age_hours(), 24);
    }

    #[test]
    fn test_deserialize_unknown_algorithm_fails() {
        let err = serde_json::from_str::<ScoringConfig>(
            r#"{"algorithm": "Euclidean", "max_top_tweets_per_cluster": 5, "max_tweet_candidate_age_hours": 24}"#,
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("invalid scoring algorithm Euclidean"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_deserialize_zero_top_tweets_fails() {
        let result = serde_json::from_str::<ScoringConfig>(
            r#"{"algorithm": 4, "max_top_tweets_per_cluster": 0, "max_tweet_candidate_age_hours": 24}"#,
        );
        assert!(result.is_err());
    }
}
