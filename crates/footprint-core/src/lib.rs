//! Footprint Core - Domain models, error taxonomy, and configuration
//!
//! This crate holds the data contracts shared by the geometry and feature
//! crates: polygon records coming in, feature table rows going out, and the
//! configuration applied uniformly to a run.

pub mod config;
pub mod error;
pub mod models;

pub use error::{FeatureError, FootprintError, GeometryError, IndexError, Result};
