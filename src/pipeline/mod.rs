// Pipelines that drive the scorer over more than one source.

pub mod batch;
