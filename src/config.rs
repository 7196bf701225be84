use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::scoring::{ScoringAlgorithm, ScoringConfig};

/// Default scoring parameters for the CLI, loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every value
/// here can be overridden per run with a command-line flag.
#[derive(Debug, Clone)]
pub struct Config {
    /// CLUSTER_ANN_ALGORITHM (default: CosineSimilarity)
    pub algorithm: ScoringAlgorithm,
    /// CLUSTER_ANN_MAX_TOP_TWEETS_PER_CLUSTER (default: 200)
    pub max_top_tweets_per_cluster: usize,
    /// CLUSTER_ANN_MIN_AGE_HOURS (default: 0)
    pub min_tweet_candidate_age_hours: u32,
    /// CLUSTER_ANN_MAX_AGE_HOURS (default: 24)
    pub max_tweet_candidate_age_hours: u32,
    /// CLUSTER_ANN_PARTITIONS — threads for aggregation (default: 1)
    pub partitions: usize,
    /// CLUSTER_ANN_CONCURRENCY — sources scored at once in batch mode (default: 8)
    pub concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables take their defaults; set-but-unparseable ones are an
    /// error rather than being silently ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            algorithm: parse_var(&lookup, "CLUSTER_ANN_ALGORITHM", ScoringAlgorithm::CosineSimilarity)?,
            max_top_tweets_per_cluster: parse_var(&lookup, "CLUSTER_ANN_MAX_TOP_TWEETS_PER_CLUSTER", 200)?,
            min_tweet_candidate_age_hours: parse_var(&lookup, "CLUSTER_ANN_MIN_AGE_HOURS", 0)?,
            max_tweet_candidate_age_hours: parse_var(&lookup, "CLUSTER_ANN_MAX_AGE_HOURS", 24)?,
            partitions: parse_var(&lookup, "CLUSTER_ANN_PARTITIONS", 1)?,
            concurrency: parse_var(&lookup, "CLUSTER_ANN_CONCURRENCY", 8)?,
        })
    }

    /// Build the per-call scoring config from these defaults.
    pub fn scoring_config(&self) -> Result<ScoringConfig> {
        ScoringConfig::new(
            self.algorithm,
            self.max_top_tweets_per_cluster,
            self.min_tweet_candidate_age_hours,
            self.max_tweet_candidate_age_hours,
        )
        .context("Invalid scoring configuration")
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        _ => Ok(default),
    }
}
