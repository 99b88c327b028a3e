//! Options controlling neighbour-dependent features.

use serde::{Deserialize, Serialize};

use super::feature::IntrinsicFeature;

/// Aggregation applied to a neighbour statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    Max,
}

impl Aggregation {
    /// Aggregate the values; `None` when there are none.
    ///
    /// Non-finite values are skipped.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        let mut values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }

        match self {
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregation::Max => values.into_iter().reduce(f64::max),
            Aggregation::Median => {
                values.sort_by(f64::total_cmp);
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    Some((values[mid - 1] + values[mid]) / 2.0)
                } else {
                    Some(values[mid])
                }
            }
        }
    }
}

/// How distances between two buildings are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean distance between centroids
    #[default]
    Centroid,
    /// Minimum Euclidean distance between boundaries (0 when touching)
    Edge,
}

/// Options applied uniformly to every building of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// Number of nearest neighbours considered
    pub k: usize,
    /// Half side of the square neighbourhood used for density, in CRS units
    pub radius: f64,
    pub aggregation: Aggregation,
    /// Intrinsic feature aggregated over the k nearest neighbours
    pub aggregate_feature: IntrinsicFeature,
    pub distance_metric: DistanceMetric,
    /// Maximum gap for two edges to count as a shared wall
    pub boundary_tolerance: f64,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            k: 5,
            radius: 100.0,
            aggregation: Aggregation::Mean,
            aggregate_feature: IntrinsicFeature::Area,
            distance_metric: DistanceMetric::Centroid,
            boundary_tolerance: 0.05,
        }
    }
}

impl RelationalConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation, feature: IntrinsicFeature) -> Self {
        self.aggregation = aggregation;
        self.aggregate_feature = feature;
        self
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_boundary_tolerance(mut self, tolerance: f64) -> Self {
        self.boundary_tolerance = tolerance;
        self
    }

    /// Area of the density neighbourhood
    pub fn neighborhood_area(&self) -> f64 {
        (2.0 * self.radius) * (2.0 * self.radius)
    }
}
