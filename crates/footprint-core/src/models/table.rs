//! Output contract handed to the export collaborator.

use serde::{Deserialize, Serialize};

use super::feature::{BlockFeatures, FeatureValue, IntrinsicFeatures, RelationalFeatures};
use super::record::BuildingId;

/// Bumped whenever a feature column is added, removed or redefined.
pub const SCHEMA_VERSION: u32 = 1;

/// Summary of which feature groups succeeded for a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Ok,
    Partial,
    Failed,
}

/// One row per input building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTableRow {
    pub id: BuildingId,
    pub status: RowStatus,
    pub intrinsic: IntrinsicFeatures,
    pub relational: RelationalFeatures,
    pub block: BlockFeatures,
    /// Why normalization failed, for `Failed` rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl FeatureTableRow {
    /// All values in column order
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        self.intrinsic.iter().chain(self.relational.iter()).chain(self.block.iter())
    }

    pub fn value(&self, name: &str) -> Option<&FeatureValue> {
        self.values().find(|(column, _)| *column == name).map(|(_, value)| value)
    }

    pub fn unavailable_count(&self) -> usize {
        self.values().filter(|(_, value)| !value.is_available()).count()
    }
}

/// The sole durable output of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub schema_version: u32,
    pub rows: Vec<FeatureTableRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureTableRow>) -> Self {
        Self { schema_version: SCHEMA_VERSION, rows }
    }

    /// Ordered list of every feature column
    pub fn feature_names() -> Vec<&'static str> {
        IntrinsicFeatures::NAMES
            .into_iter()
            .chain(RelationalFeatures::NAMES)
            .chain(BlockFeatures::NAMES)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &BuildingId) -> Option<&FeatureTableRow> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn count_status(&self, status: RowStatus) -> usize {
        self.rows.iter().filter(|row| row.status == status).count()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::FootprintError::Serialization(e.to_string()))
    }
}
