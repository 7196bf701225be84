// Cluster -> top tweets inverted index, as consumed by the scorer.
//
// Each cluster maps to the tweets most strongly associated with it, strongest
// first. The scorer only reads a prefix of every list, so the ordering is load
// bearing: an unsorted list silently changes which tweets are considered. The
// constructor checks it once so the scorer can rely on it.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Result, ScoringError};
use crate::ids::{ClusterId, TweetId};

/// (tweet id, association weight), strongest first within a cluster.
pub type ClusterCandidates = Vec<(TweetId, f64)>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawPool")]
pub struct ClusterCandidatePool {
    clusters: HashMap<ClusterId, ClusterCandidates>,
}

/// On-disk shape: `{"clusters": {"<cluster id>": [[tweet_id, weight], ...]}}`.
#[derive(Deserialize)]
struct RawPool {
    clusters: HashMap<ClusterId, ClusterCandidates>,
}

impl TryFrom<RawPool> for ClusterCandidatePool {
    type Error = ScoringError;

    fn try_from(raw: RawPool) -> Result<Self> {
        Self::new(raw.clusters)
    }
}

impl ClusterCandidatePool {
    /// Build a pool, rejecting negative/non-finite weights and lists that are
    /// not sorted by weight descending.
    pub fn new(clusters: HashMap<ClusterId, ClusterCandidates>) -> Result<Self> {
        for (&cluster_id, candidates) in &clusters {
            validate_candidates(cluster_id, candidates)?;
        }
        Ok(Self { clusters })
    }

    /// Candidates for one cluster, strongest first.
    pub fn get(&self, cluster_id: ClusterId) -> Option<&[(TweetId, f64)]> {
        self.clusters.get(&cluster_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &[(TweetId, f64)])> + '_ {
        self.clusters.iter().map(|(&c, v)| (c, v.as_slice()))
    }

    /// Number of clusters (including those with empty lists).
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total (cluster, tweet) entries across all clusters.
    pub fn entry_count(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }
}

fn validate_candidates(cluster_id: ClusterId, candidates: &[(TweetId, f64)]) -> Result<()> {
    let mut previous = f64::INFINITY;
    for (position, &(tweet_id, weight)) in candidates.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ScoringError::InvalidCandidateWeight {
                cluster_id,
                tweet_id,
                weight,
            });
        }
        if weight > previous {
            return Err(ScoringError::UnsortedCandidates {
                cluster_id,
                position,
            });
        }
        previous = weight;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_pool_accepted() {
        let pool =
            ClusterCandidatePool::new(HashMap::from([(10, vec![(1, 3.0), (2, 1.0), (3, 1.0)])]))
                .unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.entry_count(), 3);
        assert_eq!(pool.get(10).unwrap()[0], (1, 3.0));
        assert!(pool.get(11).is_none());
    }

    #[test]
    fn test_unsorted_pool_rejected() {
        let err = ClusterCandidatePool::new(HashMap::from([(10, vec![(1, 1.0), (2, 3.0)])]))
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::UnsortedCandidates {
                cluster_id: 10,
                position: 1
            }
        );
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err =
            ClusterCandidatePool::new(HashMap::from([(4, vec![(9, -1.0)])])).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InvalidCandidateWeight {
                cluster_id: 4,
                tweet_id: 9,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let pool = ClusterCandidatePool::new(HashMap::from([(4, vec![])])).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.entry_count(), 0);
    }

    #[test]
    fn test_deserialize_validates() {
        let pool: ClusterCandidatePool =
            serde_json::from_str(r#"{"clusters": {"10": [[1, 3.0], [2, 1.0]]}}"#).unwrap();
        assert_eq!(pool.get(10).unwrap(), &[(1, 3.0), (2, 1.0)]);

        let bad = serde_json::from_str::<ClusterCandidatePool>(
            r#"{"clusters": {"10": [[1, 1.0], [2, 3.0]]}}"#,
        );
        assert!(bad.is_err());
    }
}
