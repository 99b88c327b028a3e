use crate::error::{FootprintError, Result};
use crate::models::{Aggregation, DistanceMetric, IntrinsicFeature, RelationalConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Set programmatically by the caller of the run
    Override,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Override => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for a feature run
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub k: ConfigValue<usize>,
    pub radius: ConfigValue<f64>,
    pub aggregation: ConfigValue<Aggregation>,
    pub aggregate_feature: ConfigValue<IntrinsicFeature>,
    pub distance_metric: ConfigValue<DistanceMetric>,
    pub boundary_tolerance: ConfigValue<f64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let defaults = RelationalConfig::default();
        Self {
            k: ConfigValue::new(defaults.k, ConfigSource::Default),
            radius: ConfigValue::new(defaults.radius, ConfigSource::Default),
            aggregation: ConfigValue::new(defaults.aggregation, ConfigSource::Default),
            aggregate_feature: ConfigValue::new(defaults.aggregate_feature, ConfigSource::Default),
            distance_metric: ConfigValue::new(defaults.distance_metric, ConfigSource::Default),
            boundary_tolerance: ConfigValue::new(
                defaults.boundary_tolerance,
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FootprintError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(k) = file_config.k {
            self.k.update(k, ConfigSource::File);
        }

        if let Some(radius) = file_config.radius {
            self.radius.update(radius, ConfigSource::File);
        }

        if let Some(aggregation) = file_config.aggregation {
            self.aggregation.update(aggregation, ConfigSource::File);
        }

        if let Some(feature) = file_config.aggregate_feature {
            self.aggregate_feature.update(feature, ConfigSource::File);
        }

        if let Some(metric) = file_config.distance_metric {
            self.distance_metric.update(metric, ConfigSource::File);
        }

        if let Some(tolerance) = file_config.boundary_tolerance {
            self.boundary_tolerance.update(tolerance, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    ///
    /// Unparseable values are ignored with a warning.
    pub fn load_from_env(mut self) -> Self {
        // FOOTPRINT_K
        if let Ok(k_str) = env::var("FOOTPRINT_K") {
            match k_str.parse::<usize>() {
                Ok(k) => self.k.update(k, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOOTPRINT_K value '{}': expected non-negative integer",
                    k_str
                ),
            }
        }

        // FOOTPRINT_RADIUS
        if let Ok(radius_str) = env::var("FOOTPRINT_RADIUS") {
            match radius_str.parse::<f64>() {
                Ok(radius) => self.radius.update(radius, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOOTPRINT_RADIUS value '{}': expected a number",
                    radius_str
                ),
            }
        }

        // FOOTPRINT_AGGREGATION
        if let Ok(aggregation_str) = env::var("FOOTPRINT_AGGREGATION") {
            match parse_aggregation(&aggregation_str) {
                Ok(aggregation) => self.aggregation.update(aggregation, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOOTPRINT_AGGREGATION value '{}': expected mean, median, or max",
                    aggregation_str
                ),
            }
        }

        // FOOTPRINT_AGGREGATE_FEATURE
        if let Ok(feature_str) = env::var("FOOTPRINT_AGGREGATE_FEATURE") {
            match parse_intrinsic_feature(&feature_str) {
                Ok(feature) => self.aggregate_feature.update(feature, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOOTPRINT_AGGREGATE_FEATURE value '{}': expected an intrinsic feature name",
                    feature_str
                ),
            }
        }

        // FOOTPRINT_DISTANCE_METRIC
        if let Ok(metric_str) = env::var("FOOTPRINT_DISTANCE_METRIC") {
            match parse_distance_metric(&metric_str) {
                Ok(metric) => self.distance_metric.update(metric, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOOTPRINT_DISTANCE_METRIC value '{}': expected centroid or edge",
                    metric_str
                ),
            }
        }

        // FOOTPRINT_BOUNDARY_TOLERANCE
        if let Ok(tolerance_str) = env::var("FOOTPRINT_BOUNDARY_TOLERANCE") {
            match tolerance_str.parse::<f64>() {
                Ok(tolerance) => {
                    self.boundary_tolerance.update(tolerance, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid FOOTPRINT_BOUNDARY_TOLERANCE value '{}': expected a number",
                    tolerance_str
                ),
            }
        }

        self
    }

    /// Apply values set by the caller of the run
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(k) = overrides.k {
            self.k.update(k, ConfigSource::Override);
        }

        if let Some(radius) = overrides.radius {
            self.radius.update(radius, ConfigSource::Override);
        }

        if let Some(aggregation) = overrides.aggregation {
            self.aggregation.update(aggregation, ConfigSource::Override);
        }

        if let Some(feature) = overrides.aggregate_feature {
            self.aggregate_feature.update(feature, ConfigSource::Override);
        }

        if let Some(metric) = overrides.distance_metric {
            self.distance_metric.update(metric, ConfigSource::Override);
        }

        if let Some(tolerance) = overrides.boundary_tolerance {
            self.boundary_tolerance.update(tolerance, ConfigSource::Override);
        }
    }

    /// Validate and flatten into the options used by a run
    pub fn resolve(&self) -> Result<RelationalConfig> {
        let config = RelationalConfig {
            k: self.k.value,
            radius: self.radius.value,
            aggregation: self.aggregation.value,
            aggregate_feature: self.aggregate_feature.value,
            distance_metric: self.distance_metric.value,
            boundary_tolerance: self.boundary_tolerance.value,
        };
        validate(&config)?;
        Ok(config)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("k".to_string(), (self.k.value.to_string(), self.k.source));
        map.insert("radius".to_string(), (self.radius.value.to_string(), self.radius.source));
        map.insert(
            "aggregation".to_string(),
            (format!("{:?}", self.aggregation.value), self.aggregation.source),
        );
        map.insert(
            "aggregate_feature".to_string(),
            (self.aggregate_feature.value.name().to_string(), self.aggregate_feature.source),
        );
        map.insert(
            "distance_metric".to_string(),
            (format!("{:?}", self.distance_metric.value), self.distance_metric.source),
        );
        map.insert(
            "boundary_tolerance".to_string(),
            (self.boundary_tolerance.value.to_string(), self.boundary_tolerance.source),
        );

        map
    }
}

/// Check that a configuration can drive a run
pub fn validate(config: &RelationalConfig) -> Result<()> {
    if !config.radius.is_finite() || config.radius <= 0.0 {
        return Err(FootprintError::ConfigInvalid {
            key: "radius".to_string(),
            reason: format!("must be a positive finite number, got {}", config.radius),
        });
    }

    if !config.boundary_tolerance.is_finite() || config.boundary_tolerance < 0.0 {
        return Err(FootprintError::ConfigInvalid {
            key: "boundary_tolerance".to_string(),
            reason: format!(
                "must be a non-negative finite number, got {}",
                config.boundary_tolerance
            ),
        });
    }

    Ok(())
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    k: Option<usize>,
    radius: Option<f64>,
    aggregation: Option<Aggregation>,
    aggregate_feature: Option<IntrinsicFeature>,
    distance_metric: Option<DistanceMetric>,
    boundary_tolerance: Option<f64>,
}

/// Caller-supplied overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub k: Option<usize>,
    pub radius: Option<f64>,
    pub aggregation: Option<Aggregation>,
    pub aggregate_feature: Option<IntrinsicFeature>,
    pub distance_metric: Option<DistanceMetric>,
    pub boundary_tolerance: Option<f64>,
}

/// Parse aggregation from string
pub fn parse_aggregation(s: &str) -> Result<Aggregation> {
    match s.to_lowercase().as_str() {
        "mean" | "avg" => Ok(Aggregation::Mean),
        "median" => Ok(Aggregation::Median),
        "max" => Ok(Aggregation::Max),
        _ => Err(FootprintError::ConfigInvalid {
            key: "aggregation".to_string(),
            reason: format!("Invalid aggregation: {}. Use mean, median, or max", s),
        }),
    }
}

/// Parse distance metric from string
pub fn parse_distance_metric(s: &str) -> Result<DistanceMetric> {
    match s.to_lowercase().as_str() {
        "centroid" => Ok(DistanceMetric::Centroid),
        "edge" => Ok(DistanceMetric::Edge),
        _ => Err(FootprintError::ConfigInvalid {
            key: "distance_metric".to_string(),
            reason: format!("Invalid distance metric: {}. Use centroid or edge", s),
        }),
    }
}

/// Parse an intrinsic feature name
pub fn parse_intrinsic_feature(s: &str) -> Result<IntrinsicFeature> {
    IntrinsicFeature::from_name(&s.to_lowercase()).ok_or_else(|| FootprintError::ConfigInvalid {
        key: "aggregate_feature".to_string(),
        reason: format!("Unknown intrinsic feature: {}", s),
    })
}
