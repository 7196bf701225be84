// JSON input files for the CLI: a candidate pool and one or more sources.
//
// Pool file:
//   {"clusters": {"10": [[tweet_id, weight], ...], ...}}
//
// Source file (a single object, or an array of them for batch runs):
//   {"id": {"tweet": 123}, "weights": {"10": 2.0}, "l2_norm": 2.0, "log_norm": 1.0986}
//
// Norms are optional; when both are absent they're derived from the weights.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::embedding::SourceEmbedding;
use crate::ids::{ClusterId, InternalId, SourceEmbeddingId};
use crate::pipeline::batch::BatchSource;
use crate::pool::ClusterCandidatePool;

#[derive(Debug, Deserialize)]
struct RawSource {
    id: SourceEmbeddingIdSpec,
    weights: HashMap<ClusterId, f64>,
    l2_norm: Option<f64>,
    log_norm: Option<f64>,
}

/// `{"tweet": 1}` is shorthand for `{"internal_id": {"tweet": 1}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceEmbeddingIdSpec {
    Full(SourceEmbeddingId),
    Internal(InternalId),
}

impl From<SourceEmbeddingIdSpec> for SourceEmbeddingId {
    fn from(spec: SourceEmbeddingIdSpec) -> Self {
        match spec {
            SourceEmbeddingIdSpec::Full(id) => id,
            SourceEmbeddingIdSpec::Internal(internal_id) => SourceEmbeddingId { internal_id },
        }
    }
}

impl RawSource {
    fn into_batch_source(self) -> Result<BatchSource> {
        let id: SourceEmbeddingId = self.id.into();
        let embedding = match (self.l2_norm, self.log_norm) {
            (Some(l2), Some(log)) => SourceEmbedding::with_norms(self.weights, l2, log),
            (None, None) => SourceEmbedding::from_weights(self.weights),
            _ => anyhow::bail!("Source {id}: give both l2_norm and log_norm, or neither"),
        }
        .with_context(|| format!("Invalid embedding for source {id}"))?;
        Ok(BatchSource { id, embedding })
    }
}

/// Parse a pool from JSON text.
pub fn parse_pool(json: &str) -> Result<ClusterCandidatePool> {
    serde_json::from_str(json).context("Failed to parse candidate pool")
}

/// Parse one or more sources from JSON text.
pub fn parse_sources(json: &str) -> Result<Vec<BatchSource>> {
    // Not an untagged enum: buffered content can't decode integer map keys
    let value: serde_json::Value = serde_json::from_str(json).context("Failed to parse sources")?;
    let raw: Vec<RawSource> = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|one| vec![one])
    }
    .context("Failed to parse sources")?;
    raw.into_iter().map(RawSource::into_batch_source).collect()
}

pub fn load_pool(path: &Path) -> Result<ClusterCandidatePool> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool file {}", path.display()))?;
    parse_pool(&json).with_context(|| format!("In {}", path.display()))
}

pub fn load_sources(path: &Path) -> Result<Vec<BatchSource>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file {}", path.display()))?;
    parse_sources(&json).with_context(|| format!("In {}", path.display()))
}

/// Load a file that must hold exactly one source.
pub fn load_source(path: &Path) -> Result<BatchSource> {
    let mut sources = load_sources(path)?;
    if sources.len() != 1 {
        anyhow::bail!(
            "{} holds {} sources; `score` takes exactly one (use `batch` for many)",
            path.display(),
            sources.len()
        );
    }
    Ok(sources.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source_with_norms() {
        let sources = parse_sources(
            r#"{"id": {"tweet": 5}, "weights": {"10": 2.0}, "l2_norm": 2.0, "log_norm": 1.0986}"#,
        )
        .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, SourceEmbeddingId::tweet(5));
        assert_eq!(sources[0].embedding.log_norm(), 1.0986);
    }

    #[test]
    fn test_source_norms_derived_when_absent() {
        let sources = parse_sources(r#"{"id": {"user": 1}, "weights": {"1": 3.0, "2": 4.0}}"#)
            .unwrap();
        assert!((sources[0].embedding.l2_norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_id_form() {
        let sources = parse_sources(
            r#"[{"id": {"internal_id": {"user": 8}}, "weights": {"1": 1.0}}]"#,
        )
        .unwrap();
        assert_eq!(sources[0].id.internal_id, InternalId::UserId(8));
    }

    #[test]
    fn test_one_norm_only_rejected() {
        let err = parse_sources(r#"{"id": {"tweet": 5}, "weights": {"10": 2.0}, "l2_norm": 2.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("l2_norm and log_norm"), "{err}");
    }

    #[test]
    fn test_negative_source_weight_rejected() {
        assert!(parse_sources(r#"{"id": {"tweet": 5}, "weights": {"10": -2.0}}"#).is_err());
    }

    #[test]
    fn test_parse_pool() {
        let pool = parse_pool(r#"{"clusters": {"10": [[1, 3.0], [2, 1.0]], "11": []}}"#).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.entry_count(), 2);
    }

    #[test]
    fn test_load_pool_missing_file() {
        let err = load_pool(Path::new("/nonexistent/pool.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read pool file"));
    }
}
