// Approximate cosine similarity over a cluster -> top tweets index.
//
// One call runs four phases:
//   1. derive the candidate id window from the age limits
//   2. aggregate weighted overlap and squared weights per candidate over the
//      clusters shared by the source embedding and the pool
//   3. turn the sums into a score with the configured formula
//   4. keep the best MAX_NUM_RESULTS_UPPER_BOUND, highest first
//
// The call is synchronous and owns no state beyond its accumulator, so it is
// safe to run concurrently for different sources.

use std::cmp::Ordering;
use std::thread;

use serde::Serialize;
use tracing::debug;

use super::accumulator::{CandidateAccumulator, INITIAL_CANDIDATE_MAP_SIZE};
use super::algorithm::ScoringAlgorithm;
use super::config::{ScoringConfig, MAX_NUM_RESULTS_UPPER_BOUND};
use super::stats::CandidateStats;
use super::window::CandidateWindow;
use crate::clock::{Clock, SystemClock};
use crate::embedding::SourceEmbedding;
use crate::ids::{ClusterId, SourceEmbeddingId, TweetId};
use crate::pool::ClusterCandidatePool;
use crate::snowflake::{IdMinter, SnowflakeIds};

/// One ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredTweet {
    pub tweet_id: TweetId,
    pub score: f64,
}

/// Execution knobs that don't change results beyond float rounding.
#[derive(Debug, Clone, Copy)]
pub struct ScorerOptions {
    /// Cluster partitions aggregated on separate threads. 1 = sequential.
    pub partitions: usize,
}

impl Default for ScorerOptions {
    fn default() -> Self {
        Self { partitions: 1 }
    }
}

/// The candidate scorer, bound to a time source and an id scheme.
pub struct CandidateScorer<C = SystemClock, M = SnowflakeIds> {
    clock: C,
    minter: M,
    options: ScorerOptions,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateScorer {
    /// Wall clock, standard Snowflake ids, sequential aggregation.
    pub fn new() -> Self {
        Self {
            clock: SystemClock,
            minter: SnowflakeIds,
            options: ScorerOptions::default(),
        }
    }
}

impl<C: Clock, M: IdMinter> CandidateScorer<C, M> {
    pub fn with_parts(clock: C, minter: M, options: ScorerOptions) -> Self {
        Self {
            clock,
            minter,
            options,
        }
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> CandidateScorer<C2, M> {
        CandidateScorer {
            clock,
            minter: self.minter,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: ScorerOptions) -> Self {
        self.options = options;
        self
    }

    /// Window the scorer would use for `config` right now.
    pub fn window(&self, config: &ScoringConfig) -> CandidateWindow {
        CandidateWindow::derive(self.clock.now(), config, &self.minter)
    }

    /// Rank candidates from `pool` by similarity to `source`.
    ///
    /// Reports the number of distinct candidates found to `stats` exactly
    /// once, before normalization.
    pub fn score(
        &self,
        source: &SourceEmbedding,
        source_id: &SourceEmbeddingId,
        config: &ScoringConfig,
        pool: &ClusterCandidatePool,
        stats: &dyn CandidateStats,
    ) -> Vec<ScoredTweet> {
        let window = self.window(config);

        let accumulator = if self.options.partitions > 1 {
            aggregate_partitioned(
                source,
                source_id,
                pool,
                &window,
                config.max_top_tweets_per_cluster(),
                self.options.partitions,
            )
        } else {
            aggregate(
                source,
                source_id,
                pool,
                &window,
                config.max_top_tweets_per_cluster(),
            )
        };

        let candidates = accumulator.len();
        stats.record_candidate_count(candidates);

        let scored = normalize(accumulator, config.algorithm(), source);
        let ranked = select_top(scored, MAX_NUM_RESULTS_UPPER_BOUND);

        debug!(
            source = %source_id,
            algorithm = %config.algorithm(),
            earliest = window.earliest_allowed_id,
            latest = window.latest_allowed_id,
            candidates,
            returned = ranked.len(),
            "Scored candidates"
        );

        ranked
    }
}

/// Accumulate overlap sums for every cluster shared by `source` and `pool`.
///
/// Only the first `max_top_tweets_per_cluster` entries of each list are read.
/// Self-matches and ids outside `window` are skipped.
pub fn aggregate(
    source: &SourceEmbedding,
    source_id: &SourceEmbeddingId,
    pool: &ClusterCandidatePool,
    window: &CandidateWindow,
    max_top_tweets_per_cluster: usize,
) -> CandidateAccumulator {
    let mut accumulator = CandidateAccumulator::new();
    for (cluster_id, candidates) in pool.iter() {
        accumulate_cluster(
            &mut accumulator,
            source,
            source_id,
            cluster_id,
            candidates,
            window,
            max_top_tweets_per_cluster,
        );
    }
    accumulator
}

/// Same sums as `aggregate`, computed over `partitions` disjoint cluster
/// groups on scoped threads and merged at the end.
pub fn aggregate_partitioned(
    source: &SourceEmbedding,
    source_id: &SourceEmbeddingId,
    pool: &ClusterCandidatePool,
    window: &CandidateWindow,
    max_top_tweets_per_cluster: usize,
    partitions: usize,
) -> CandidateAccumulator {
    // Only clusters that can contribute are worth shipping to a thread
    let shared: Vec<(ClusterId, &[(TweetId, f64)])> = pool
        .iter()
        .filter(|(cluster_id, candidates)| !candidates.is_empty() && source.contains(*cluster_id))
        .collect();

    let partitions = partitions.clamp(1, shared.len().max(1));
    let chunk_size = shared.len().div_ceil(partitions).max(1);

    thread::scope(|scope| {
        let handles: Vec<_> = shared
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut partial = CandidateAccumulator::with_capacity(
                        chunk
                            .len()
                            .saturating_mul(max_top_tweets_per_cluster)
                            .min(INITIAL_CANDIDATE_MAP_SIZE),
                    );
                    for &(cluster_id, candidates) in chunk {
                        accumulate_cluster(
                            &mut partial,
                            source,
                            source_id,
                            cluster_id,
                            candidates,
                            window,
                            max_top_tweets_per_cluster,
                        );
                    }
                    partial
                })
            })
            .collect();

        let mut merged = CandidateAccumulator::new();
        for handle in handles {
            let partial = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            merged.merge(partial);
        }
        merged
    })
}

fn accumulate_cluster(
    accumulator: &mut CandidateAccumulator,
    source: &SourceEmbedding,
    source_id: &SourceEmbeddingId,
    cluster_id: ClusterId,
    candidates: &[(TweetId, f64)],
    window: &CandidateWindow,
    max_top_tweets_per_cluster: usize,
) {
    let Some(source_weight) = source.weight(cluster_id) else {
        return;
    };
    let take = candidates.len().min(max_top_tweets_per_cluster);
    for &(tweet_id, weight) in &candidates[..take] {
        if source_id.is_same_tweet(tweet_id) || !window.contains(tweet_id) {
            continue;
        }
        accumulator.add(tweet_id, weight, source_weight);
    }
}

/// Apply `algorithm` to every accumulated candidate.
pub fn normalize(
    accumulator: CandidateAccumulator,
    algorithm: ScoringAlgorithm,
    source: &SourceEmbedding,
) -> Vec<ScoredTweet> {
    accumulator
        .into_iter()
        .map(|(tweet_id, sums)| ScoredTweet {
            tweet_id,
            score: algorithm.score(sums, source),
        })
        .collect()
}

/// Highest score first, ties by ascending tweet id, at most `limit` entries.
pub fn select_top(mut scored: Vec<ScoredTweet>, limit: usize) -> Vec<ScoredTweet> {
    if limit == 0 {
        return Vec::new();
    }
    if scored.len() > limit {
        scored.select_nth_unstable_by(limit - 1, rank_order);
        scored.truncate(limit);
    }
    scored.sort_unstable_by(rank_order);
    scored
}

fn rank_order(a: &ScoredTweet, b: &ScoredTweet) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.tweet_id.cmp(&b.tweet_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::scoring::stats::NullStats;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn scorer() -> CandidateScorer<FixedClock> {
        CandidateScorer::new().with_clock(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn open_window() -> CandidateWindow {
        CandidateWindow {
            earliest_allowed_id: 0,
            latest_allowed_id: u64::MAX,
        }
    }

    #[test]
    fn test_select_top_orders_and_truncates() {
        let scored = vec![
            ScoredTweet { tweet_id: 1, score: 0.5 },
            ScoredTweet { tweet_id: 2, score: 2.0 },
            ScoredTweet { tweet_id: 3, score: 1.0 },
        ];
        let top = select_top(scored, 2);
        assert_eq!(
            top.iter().map(|s| s.tweet_id).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_select_top_breaks_ties_by_id() {
        let scored = vec![
            ScoredTweet { tweet_id: 9, score: 1.0 },
            ScoredTweet { tweet_id: 4, score: 1.0 },
            ScoredTweet { tweet_id: 7, score: 1.0 },
        ];
        let top = select_top(scored, 10);
        assert_eq!(
            top.iter().map(|s| s.tweet_id).collect::<Vec<_>>(),
            vec![4, 7, 9]
        );
    }

    #[test]
    fn test_select_top_zero_limit() {
        let scored = vec![ScoredTweet { tweet_id: 1, score: 1.0 }];
        assert!(select_top(scored, 0).is_empty());
    }

    #[test]
    fn test_aggregate_reads_only_prefix() {
        let source = SourceEmbedding::from_weights(HashMap::from([(1, 1.0)])).unwrap();
        let pool = ClusterCandidatePool::new(HashMap::from([(
            1,
            vec![(10, 3.0), (11, 2.0), (12, 1.0)],
        )]))
        .unwrap();
        let acc = aggregate(&source, &SourceEmbeddingId::user(1), &pool, &open_window(), 2);
        assert_eq!(acc.len(), 2);
        assert!(acc.get(12).is_none());
    }

    #[test]
    fn test_aggregate_skips_clusters_missing_from_source() {
        let source = SourceEmbedding::from_weights(HashMap::from([(1, 1.0)])).unwrap();
        let pool = ClusterCandidatePool::new(HashMap::from([
            (1, vec![(10, 3.0)]),
            (2, vec![(20, 3.0)]),
        ]))
        .unwrap();
        let acc = aggregate(&source, &SourceEmbeddingId::user(1), &pool, &open_window(), 5);
        assert_eq!(acc.len(), 1);
        assert!(acc.get(20).is_none());
    }

    #[test]
    fn test_partitioned_matches_sequential() {
        let mut weights = HashMap::new();
        let mut clusters = HashMap::new();
        for c in 0..40 {
            weights.insert(c, 0.1 + c as f64 * 0.05);
            let list: Vec<(TweetId, f64)> = (0..25u64)
                .map(|i| ((i * 7 + c as u64) % 60, 5.0 - i as f64 * 0.2))
                .collect();
            clusters.insert(c, list);
        }
        let source = SourceEmbedding::from_weights(weights).unwrap();
        let pool = ClusterCandidatePool::new(clusters).unwrap();
        let id = SourceEmbeddingId::tweet(3);

        let sequential = aggregate(&source, &id, &pool, &open_window(), 20);
        let partitioned = aggregate_partitioned(&source, &id, &pool, &open_window(), 20, 4);

        assert_eq!(sequential.len(), partitioned.len());
        for (tweet_id, sums) in sequential.iter() {
            let other = partitioned.get(tweet_id).unwrap();
            assert!((sums.weighted_sum - other.weighted_sum).abs() < 1e-9);
            assert!((sums.squared_sum - other.squared_sum).abs() < 1e-9);
        }
        assert!(sequential.get(3).is_none());
    }

    #[test]
    fn test_partitioned_with_more_partitions_than_clusters() {
        let source = SourceEmbedding::from_weights(HashMap::from([(1, 2.0)])).unwrap();
        let pool = ClusterCandidatePool::new(HashMap::from([(1, vec![(10, 1.0)])])).unwrap();
        let acc = aggregate_partitioned(
            &source,
            &SourceEmbeddingId::user(1),
            &pool,
            &open_window(),
            5,
            16,
        );
        assert_eq!(acc.get(10).unwrap().weighted_sum, 2.0);
    }

    #[test]
    fn test_partitioned_empty_pool() {
        let source = SourceEmbedding::from_weights(HashMap::from([(1, 2.0)])).unwrap();
        let acc = aggregate_partitioned(
            &source,
            &SourceEmbeddingId::user(1),
            &ClusterCandidatePool::default(),
            &open_window(),
            5,
            4,
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_score_with_partitions_option() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let recent = crate::snowflake::first_id_for(now - chrono::Duration::hours(2));
        let source =
            SourceEmbedding::from_weights(HashMap::from([(1, 1.0), (2, 1.0)])).unwrap();
        let pool = ClusterCandidatePool::new(HashMap::from([
            (1, vec![(recent, 2.0)]),
            (2, vec![(recent, 1.0), (recent + 1, 0.5)]),
        ]))
        .unwrap();
        let config = ScoringConfig::new(ScoringAlgorithm::DotProduct, 10, 0, 24).unwrap();

        let parallel = scorer().with_options(ScorerOptions { partitions: 2 });
        let ranked = parallel.score(&source, &SourceEmbeddingId::user(1), &config, &pool, &NullStats);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].tweet_id, recent);
        assert!((ranked[0].score - 3.0).abs() < 1e-12);
    }
}
