// Per-candidate running sums for one scoring call.
//
// Both sums for a candidate live in one record so they can't drift apart,
// and so merging partial accumulators (one per cluster partition) is a single
// keyed addition.

use std::collections::hash_map;
use std::collections::HashMap;

use crate::ids::TweetId;

/// Initial map capacity. A capacity hint only.
pub const INITIAL_CANDIDATE_MAP_SIZE: usize = 16384;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandidateSums {
    /// sum(candidate_weight * source_cluster_weight) over shared clusters
    pub weighted_sum: f64,
    /// sum(candidate_weight^2) over shared clusters
    pub squared_sum: f64,
}

impl CandidateSums {
    fn absorb(&mut self, other: CandidateSums) {
        self.weighted_sum += other.weighted_sum;
        self.squared_sum += other.squared_sum;
    }
}

#[derive(Debug, Clone)]
pub struct CandidateAccumulator {
    sums: HashMap<TweetId, CandidateSums>,
}

impl Default for CandidateAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateAccumulator {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CANDIDATE_MAP_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sums: HashMap::with_capacity(capacity),
        }
    }

    /// Record one (cluster, candidate) contribution.
    pub fn add(&mut self, tweet_id: TweetId, candidate_weight: f64, source_weight: f64) {
        let entry = self.sums.entry(tweet_id).or_default();
        entry.weighted_sum += candidate_weight * source_weight;
        entry.squared_sum += candidate_weight * candidate_weight;
    }

    /// Fold another accumulator into this one. Order-independent up to
    /// floating-point rounding.
    pub fn merge(&mut self, other: CandidateAccumulator) {
        if other.sums.len() > self.sums.len() {
            let smaller = std::mem::replace(&mut self.sums, other.sums);
            self.absorb_all(smaller);
        } else {
            self.absorb_all(other.sums);
        }
    }

    fn absorb_all(&mut self, sums: HashMap<TweetId, CandidateSums>) {
        for (tweet_id, partial) in sums {
            self.sums.entry(tweet_id).or_default().absorb(partial);
        }
    }

    pub fn get(&self, tweet_id: TweetId) -> Option<CandidateSums> {
        self.sums.get(&tweet_id).copied()
    }

    /// Number of distinct candidates touched.
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TweetId, CandidateSums)> + '_ {
        self.sums.iter().map(|(&id, &s)| (id, s))
    }
}

impl IntoIterator for CandidateAccumulator {
    type Item = (TweetId, CandidateSums);
    type IntoIter = hash_map::IntoIter<TweetId, CandidateSums>;

    fn into_iter(self) -> Self::IntoIter {
        self.sums.into_iter()
    }
}
