//! Footprint Features - Relational features, block grouping, and the run pipeline
//!
//! This crate implements the neighbour-dependent feature extraction and
//! orchestrates a full run: normalization, indexing, extraction and
//! assembly of the feature table.

pub mod assemble;
pub mod blocks;
pub mod models;
pub mod pipeline;
pub mod relational;

pub use assemble::assemble;
pub use models::{CancellationToken, RunProgress, RunStats, Stage};
pub use pipeline::FeaturePipeline;
pub use relational::{NeighborLookup, RelationalOutcome};
