// Library error type.
//
// The scoring kernel itself cannot fail once its inputs are built. Every
// variant here is raised at a construction or parsing boundary: an algorithm
// name that doesn't map to a known formula, or weights that would turn the
// normalization into NaN.

use thiserror::Error;

use crate::ids::{ClusterId, TweetId};

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    /// The configured scoring algorithm isn't one of the four known formulas.
    /// Carries the raw value as it arrived (name or wire code).
    #[error("invalid scoring algorithm {0}")]
    UnknownAlgorithm(String),

    /// A source embedding weight is negative or not finite.
    #[error("invalid weight {weight} for cluster {cluster_id} in source embedding")]
    InvalidSourceWeight { cluster_id: ClusterId, weight: f64 },

    /// A candidate pool weight is negative or not finite.
    #[error("invalid weight {weight} for tweet {tweet_id} in cluster {cluster_id}")]
    InvalidCandidateWeight {
        cluster_id: ClusterId,
        tweet_id: TweetId,
        weight: f64,
    },

    /// A cluster's candidate list is not sorted by weight descending.
    #[error("candidates for cluster {cluster_id} are not sorted by weight (position {position})")]
    UnsortedCandidates { cluster_id: ClusterId, position: usize },

    /// A caller-supplied norm is negative, not finite, or zero for a non-zero
    /// embedding.
    #[error("invalid {kind} norm {value}")]
    InvalidNorm { kind: &'static str, value: f64 },

    /// `max_top_tweets_per_cluster` must be at least 1.
    #[error("max_top_tweets_per_cluster must be positive")]
    ZeroTopTweets,
}

pub type Result<T> = std::result::Result<T, ScoringError>;
