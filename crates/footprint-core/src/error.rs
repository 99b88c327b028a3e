//! Error types for the footprint feature engine
//!
//! Per-building errors (`GeometryError`) and per-feature errors
//! (`FeatureError`) are recorded in the output table. Only `IndexError`,
//! configuration errors and run-level failures reach the caller as `Err`.

use thiserror::Error;

/// A polygon record could not be turned into a normalized geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Degenerate geometry: {reason}")]
    Degenerate { reason: String },

    #[error("Unrepairable geometry: {reason}")]
    Unrepairable { reason: String },
}

impl GeometryError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate { reason: reason.into() }
    }

    pub fn unrepairable(reason: impl Into<String>) -> Self {
        Self::Unrepairable { reason: reason.into() }
    }
}

/// A single feature could not be computed for one building.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Feature {feature} unavailable: {reason}")]
    Unavailable { feature: String, reason: String },
}

impl FeatureError {
    pub fn unavailable(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable { feature: feature.into(), reason: reason.into() }
    }
}

/// The spatial index could not be constructed. Fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("Spatial index build failed: {reason}")]
    BuildFailure { reason: String },
}

#[derive(Debug, Error)]
pub enum FootprintError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Index(#[from] IndexError),

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Run errors
    #[error("Duplicate building identifier in input: {id}")]
    DuplicateId { id: String },

    #[error("Run cancelled before completion")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FootprintError {
    /// Whether this error aborted a whole run (as opposed to one building).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FootprintError::Geometry(_) | FootprintError::Feature(_))
    }
}

pub type Result<T> = std::result::Result<T, FootprintError>;
