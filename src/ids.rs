// Identifier types shared across the scorer.
//
// Cluster and tweet ids are plain integers. The identity of a source
// embedding is tagged with what kind of entity it belongs to, so that a user
// embedding whose numeric id happens to collide with a tweet id never causes
// that tweet to be dropped as a self-match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque cluster identifier, used only as a lookup key.
pub type ClusterId = i32;

/// Snowflake tweet identifier. Ordering follows creation time.
pub type TweetId = u64;

/// The entity an embedding was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InternalId {
    #[serde(rename = "tweet")]
    TweetId(TweetId),
    #[serde(rename = "user")]
    UserId(u64),
    #[serde(rename = "cluster")]
    ClusterId(ClusterId),
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalId::TweetId(id) => write!(f, "tweet:{id}"),
            InternalId::UserId(id) => write!(f, "user:{id}"),
            InternalId::ClusterId(id) => write!(f, "cluster:{id}"),
        }
    }
}

/// Identity of the source embedding being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceEmbeddingId {
    pub internal_id: InternalId,
}

impl SourceEmbeddingId {
    pub fn tweet(id: TweetId) -> Self {
        Self {
            internal_id: InternalId::TweetId(id),
        }
    }

    pub fn user(id: u64) -> Self {
        Self {
            internal_id: InternalId::UserId(id),
        }
    }

    /// True when `candidate` is the very tweet this embedding represents.
    ///
    /// Compares identities, not raw numbers: only a tweet-typed source can
    /// match a candidate tweet.
    pub fn is_same_tweet(&self, candidate: TweetId) -> bool {
        self.internal_id == InternalId::TweetId(candidate)
    }
}

impl fmt::Display for SourceEmbeddingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.internal_id.fmt(f)
    }
}
