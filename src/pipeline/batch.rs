// Batch scoring: many source embeddings against one shared pool.
//
// Each scoring call is CPU-bound and synchronous, so it runs on
// spawn_blocking; up to `concurrency` calls are in flight at once. Results
// come back in the same order as the sources went in.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::clock::Clock;
use crate::embedding::SourceEmbedding;
use crate::ids::SourceEmbeddingId;
use crate::pool::ClusterCandidatePool;
use crate::scoring::ann::{CandidateScorer, ScoredTweet};
use crate::scoring::config::ScoringConfig;
use crate::scoring::stats::CandidateStats;
use crate::snowflake::IdMinter;

/// One source to score.
#[derive(Debug, Clone)]
pub struct BatchSource {
    pub id: SourceEmbeddingId,
    pub embedding: SourceEmbedding,
}

/// Ranked candidates for one source.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub source_id: SourceEmbeddingId,
    pub candidates: Vec<ScoredTweet>,
}

/// Score every source in `sources` against `pool`.
///
/// `stats` receives one report per source. Set `show_progress` to draw a
/// progress bar on stderr.
#[allow(clippy::too_many_arguments)]
pub async fn score_batch<C, M, S>(
    scorer: Arc<CandidateScorer<C, M>>,
    pool: Arc<ClusterCandidatePool>,
    config: ScoringConfig,
    sources: Vec<BatchSource>,
    stats: Arc<S>,
    concurrency: usize,
    show_progress: bool,
) -> Result<Vec<BatchResult>>
where
    C: Clock + 'static,
    M: IdMinter + 'static,
    S: CandidateStats + Send + Sync + 'static,
{
    let total = sources.len();

    let pb = if show_progress {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Scoring [{bar:30}] {pos}/{len} ({eta})")
                .context("Invalid progress bar template")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<Result<(usize, BatchResult)>> =
        stream::iter(sources.into_iter().enumerate().map(|(index, source)| {
            let scorer = Arc::clone(&scorer);
            let pool = Arc::clone(&pool);
            let stats = Arc::clone(&stats);
            async move {
                let source_id = source.id;
                let candidates = tokio::task::spawn_blocking(move || {
                    scorer.score(&source.embedding, &source.id, &config, &pool, &*stats)
                })
                .await
                .context("spawn_blocking panicked")?;
                Ok::<_, anyhow::Error>((
                    index,
                    BatchResult {
                        source_id,
                        candidates,
                    },
                ))
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .inspect(|_| pb.inc(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut ordered = results.into_iter().collect::<Result<Vec<_>>>()?;
    ordered.sort_by_key(|(index, _)| *index);

    info!(
        sources = total,
        algorithm = %config.algorithm(),
        "Batch scoring complete"
    );

    Ok(ordered.into_iter().map(|(_, result)| result).collect())
}
