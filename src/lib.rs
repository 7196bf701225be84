// cluster-ann: approximate cosine-similarity scoring over a cluster index.
//
// This is the library root. `scoring` holds the candidate scorer itself; the
// other modules are its inputs (embedding, pool, ids, clock) and the CLI
// plumbing around it (config, input files, batch pipeline, output).

pub mod clock;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ids;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod scoring;
pub mod snowflake;

pub use error::ScoringError;
