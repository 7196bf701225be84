// Sparse cluster embedding for the source side of a scoring call.
//
// A source embedding is a weight per cluster the tweet (or user) belongs to,
// plus two norms the cosine formulas divide by. Norms are normally computed
// here from the weights, but callers that already have them (e.g. from the
// service that produced the embedding) can pass them through unchanged.

use std::collections::HashMap;

use crate::error::{Result, ScoringError};
use crate::ids::ClusterId;

#[derive(Debug, Clone)]
pub struct SourceEmbedding {
    weights: HashMap<ClusterId, f64>,
    l2_norm: f64,
    log_norm: f64,
}

impl SourceEmbedding {
    /// Build an embedding and derive both norms from its weights.
    ///
    /// Weights must be finite and non-negative; anything else would leak NaN
    /// into the log/sqrt normalization downstream.
    pub fn from_weights(weights: HashMap<ClusterId, f64>) -> Result<Self> {
        validate_weights(&weights)?;
        let l2_norm = l2_norm(weights.values().copied());
        let log_norm = log_norm(weights.values().copied());
        Ok(Self {
            weights,
            l2_norm,
            log_norm,
        })
    }

    /// Build an embedding with norms supplied by the caller.
    ///
    /// A zero norm is only accepted when every weight is zero too.
    pub fn with_norms(weights: HashMap<ClusterId, f64>, l2_norm: f64, log_norm: f64) -> Result<Self> {
        validate_weights(&weights)?;
        let any_positive = weights.values().any(|&w| w > 0.0);
        validate_norm("l2", l2_norm, any_positive)?;
        validate_norm("log", log_norm, any_positive)?;
        Ok(Self {
            weights,
            l2_norm,
            log_norm,
        })
    }

    /// Weight for `cluster_id`, if the embedding has one.
    pub fn weight(&self, cluster_id: ClusterId) -> Option<f64> {
        self.weights.get(&cluster_id).copied()
    }

    pub fn contains(&self, cluster_id: ClusterId) -> bool {
        self.weights.contains_key(&cluster_id)
    }

    pub fn l2_norm(&self) -> f64 {
        self.l2_norm
    }

    pub fn log_norm(&self) -> f64 {
        self.log_norm
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, f64)> + '_ {
        self.weights.iter().map(|(&c, &w)| (c, w))
    }
}

/// Euclidean norm: sqrt(sum(w^2)).
pub fn l2_norm(weights: impl Iterator<Item = f64>) -> f64 {
    weights.map(|w| w * w).sum::<f64>().sqrt()
}

/// Log-domain norm: sqrt(sum(ln(1 + w)^2)).
pub fn log_norm(weights: impl Iterator<Item = f64>) -> f64 {
    weights
        .map(|w| {
            let l = w.ln_1p();
            l * l
        })
        .sum::<f64>()
        .sqrt()
}

fn validate_weights(weights: &HashMap<ClusterId, f64>) -> Result<()> {
    for (&cluster_id, &weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ScoringError::InvalidSourceWeight { cluster_id, weight });
        }
    }
    Ok(())
}

fn validate_norm(kind: &'static str, value: f64, any_positive: bool) -> Result<()> {
    if !value.is_finite() || value < 0.0 || (any_positive && value == 0.0) {
        return Err(ScoringError::InvalidNorm { kind, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(pairs: &[(ClusterId, f64)]) -> HashMap<ClusterId, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_norms_single_cluster() {
        let emb = SourceEmbedding::from_weights(weights(&[(10, 2.0)])).unwrap();
        assert!((emb.l2_norm() - 2.0).abs() < 1e-12);
        // ln(3) ~= 1.0986
        assert!((emb.log_norm() - 3.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_norms_multiple_clusters() {
        let emb = SourceEmbedding::from_weights(weights(&[(1, 3.0), (2, 4.0)])).unwrap();
        assert!((emb.l2_norm() - 5.0).abs() < 1e-12);
        let expected_log = (4.0_f64.ln().powi(2) + 5.0_f64.ln().powi(2)).sqrt();
        assert!((emb.log_norm() - expected_log).abs() < 1e-12);
    }

    #[test]
    fn test_empty_embedding_has_zero_norms() {
        let emb = SourceEmbedding::from_weights(HashMap::new()).unwrap();
        assert!(emb.is_empty());
        assert_eq!(emb.l2_norm(), 0.0);
        assert_eq!(emb.log_norm(), 0.0);
    }

    #[test]
    fn test_lookup_and_membership() {
        let emb = SourceEmbedding::from_weights(weights(&[(10, 2.0)])).unwrap();
        assert!(emb.contains(10));
        assert!(!emb.contains(11));
        assert_eq!(emb.weight(10), Some(2.0));
        assert_eq!(emb.weight(11), None);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = SourceEmbedding::from_weights(weights(&[(3, -0.5)])).unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidSourceWeight {
                cluster_id: 3,
                weight: -0.5
            }
        );
    }

    #[test]
    fn test_nan_weight_rejected() {
        assert!(SourceEmbedding::from_weights(weights(&[(3, f64::NAN)])).is_err());
    }

    #[test]
    fn test_caller_norms_kept() {
        let emb = SourceEmbedding::with_norms(weights(&[(10, 2.0)]), 7.0, 1.5).unwrap();
        assert_eq!(emb.l2_norm(), 7.0);
        assert_eq!(emb.log_norm(), 1.5);
    }

    #[test]
    fn test_negative_caller_norm_rejected() {
        let err = SourceEmbedding::with_norms(weights(&[(10, 2.0)]), -1.0, 1.0).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidNorm { kind: "l2", .. }));
    }

    #[test]
    fn test_zero_caller_norm_with_positive_weight_rejected() {
        let err = SourceEmbedding::with_norms(weights(&[(10, 2.0)]), 0.0, 1.0).unwrap_err();
        assert_eq!(err, ScoringError::InvalidNorm { kind: "l2", value: 0.0 });

        let err = SourceEmbedding::with_norms(weights(&[(10, 2.0)]), 2.0, 0.0).unwrap_err();
        assert_eq!(err, ScoringError::InvalidNorm { kind: "log", value: 0.0 });
    }

    #[test]
    fn test_zero_caller_norms_with_zero_weights_allowed() {
        let emb = SourceEmbedding::with_norms(weights(&[(10, 0.0)]), 0.0, 0.0).unwrap();
        assert_eq!(emb.l2_norm(), 0.0);
        assert!(SourceEmbedding::with_norms(HashMap::new(), 0.0, 0.0).is_ok());
    }
}
