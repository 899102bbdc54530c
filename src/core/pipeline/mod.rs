//! # Pipeline Module
//!
//! The coordinator: fans candidates out across a bounded worker pool,
//! drains results, batches index commits, and drives the run end to end.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineResult};
