//! Feature values and the named feature groups of a table row.
//!
//! Every group is a struct with one named field per feature so the output
//! schema is explicit. `NAMES` lists the columns in their fixed order and
//! `iter()` yields `(name, value)` pairs in that same order.

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// A single feature value for one building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
    /// Could not be computed; distinct from zero.
    Unavailable(String),
}

impl FeatureValue {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        FeatureValue::Unavailable(reason.into())
    }

    /// Wrap a computed number, rejecting NaN and infinities
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            FeatureValue::Numeric(value)
        } else {
            FeatureValue::Unavailable(format!("non-finite value {}", value))
        }
    }

    /// Convert a per-feature computation result into a value
    pub fn from_result(result: std::result::Result<f64, FeatureError>) -> Self {
        match result {
            Ok(value) => Self::from_f64(value),
            Err(FeatureError::Unavailable { reason, .. }) => FeatureValue::Unavailable(reason),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, FeatureValue::Unavailable(_))
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

/// Names one intrinsic descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntrinsicFeature {
    #[default]
    Area,
    Perimeter,
    Compactness,
    Elongation,
    Orientation,
    Convexity,
    Phi,
    LongestAxisLength,
    Corners,
    HoleCount,
}

impl IntrinsicFeature {
    pub const ALL: [IntrinsicFeature; 10] = [
        IntrinsicFeature::Area,
        IntrinsicFeature::Perimeter,
        IntrinsicFeature::Compactness,
        IntrinsicFeature::Elongation,
        IntrinsicFeature::Orientation,
        IntrinsicFeature::Convexity,
        IntrinsicFeature::Phi,
        IntrinsicFeature::LongestAxisLength,
        IntrinsicFeature::Corners,
        IntrinsicFeature::HoleCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IntrinsicFeature::Area => "area",
            IntrinsicFeature::Perimeter => "perimeter",
            IntrinsicFeature::Compactness => "compactness",
            IntrinsicFeature::Elongation => "elongation",
            IntrinsicFeature::Orientation => "orientation",
            IntrinsicFeature::Convexity => "convexity",
            IntrinsicFeature::Phi => "phi",
            IntrinsicFeature::LongestAxisLength => "longest_axis_length",
            IntrinsicFeature::Corners => "corners",
            IntrinsicFeature::HoleCount => "hole_count",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Per-polygon geometric descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicFeatures {
    pub area: FeatureValue,
    pub perimeter: FeatureValue,
    pub compactness: FeatureValue,
    pub elongation: FeatureValue,
    /// Degrees in [0, 180)
    pub orientation: FeatureValue,
    pub convexity: FeatureValue,
    pub phi: FeatureValue,
    pub longest_axis_length: FeatureValue,
    pub corners: FeatureValue,
    pub hole_count: FeatureValue,
}

impl IntrinsicFeatures {
    pub const NAMES: [&'static str; 10] = [
        "area",
        "perimeter",
        "compactness",
        "elongation",
        "orientation",
        "convexity",
        "phi",
        "longest_axis_length",
        "corners",
        "hole_count",
    ];

    /// All descriptors unavailable for the same reason
    pub fn unavailable(reason: &str) -> Self {
        let v = || FeatureValue::unavailable(reason);
        Self {
            area: v(),
            perimeter: v(),
            compactness: v(),
            elongation: v(),
            orientation: v(),
            convexity: v(),
            phi: v(),
            longest_axis_length: v(),
            corners: v(),
            hole_count: v(),
        }
    }

    pub fn get(&self, feature: IntrinsicFeature) -> &FeatureValue {
        match feature {
            IntrinsicFeature::Area => &self.area,
            IntrinsicFeature::Perimeter => &self.perimeter,
            IntrinsicFeature::Compactness => &self.compactness,
            IntrinsicFeature::Elongation => &self.elongation,
            IntrinsicFeature::Orientation => &self.orientation,
            IntrinsicFeature::Convexity => &self.convexity,
            IntrinsicFeature::Phi => &self.phi,
            IntrinsicFeature::LongestAxisLength => &self.longest_axis_length,
            IntrinsicFeature::Corners => &self.corners,
            IntrinsicFeature::HoleCount => &self.hole_count,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        IntrinsicFeature::ALL.into_iter().map(move |f| (f.name(), self.get(f)))
    }
}

/// Neighbour-dependent descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalFeatures {
    pub nearest_neighbor_distance: FeatureValue,
    pub mean_knn_distance: FeatureValue,
    pub neighbor_count: FeatureValue,
    pub local_density: FeatureValue,
    pub shared_boundary_ratio: FeatureValue,
    pub shared_wall_length: FeatureValue,
    pub touches: FeatureValue,
    /// Configured aggregation of the configured intrinsic feature over the k-NN set
    pub neighbor_aggregate: FeatureValue,
}

impl RelationalFeatures {
    pub const NAMES: [&'static str; 8] = [
        "nearest_neighbor_distance",
        "mean_knn_distance",
        "neighbor_count",
        "local_density",
        "shared_boundary_ratio",
        "shared_wall_length",
        "touches",
        "neighbor_aggregate",
    ];

    pub fn unavailable(reason: &str) -> Self {
        let v = || FeatureValue::unavailable(reason);
        Self {
            nearest_neighbor_distance: v(),
            mean_knn_distance: v(),
            neighbor_count: v(),
            local_density: v(),
            shared_boundary_ratio: v(),
            shared_wall_length: v(),
            touches: v(),
            neighbor_aggregate: v(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        let values = [
            &self.nearest_neighbor_distance,
            &self.mean_knn_distance,
            &self.neighbor_count,
            &self.local_density,
            &self.shared_boundary_ratio,
            &self.shared_wall_length,
            &self.touches,
            &self.neighbor_aggregate,
        ];
        Self::NAMES.into_iter().zip(values)
    }
}

/// Descriptors of the group of buildings connected through shared walls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFeatures {
    /// Smallest member id of the block
    pub block_id: FeatureValue,
    pub block_size: FeatureValue,
    pub block_area: FeatureValue,
}

impl BlockFeatures {
    pub const NAMES: [&'static str; 3] = ["block_id", "block_size", "block_area"];

    pub fn unavailable(reason: &str) -> Self {
        Self {
            block_id: FeatureValue::unavailable(reason),
            block_size: FeatureValue::unavailable(reason),
            block_area: FeatureValue::unavailable(reason),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        Self::NAMES.into_iter().zip([&self.block_id, &self.block_size, &self.block_area])
    }
}
