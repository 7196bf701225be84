// Candidate scoring — window, aggregation, normalization, selection.

pub mod accumulator;
pub mod algorithm;
pub mod ann;
pub mod config;
pub mod stats;
pub mod window;

pub use algorithm::ScoringAlgorithm;
pub use ann::{CandidateScorer, ScoredTweet, ScorerOptions};
pub use config::ScoringConfig;
