//! Input records handed over by the ingestion collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, unique identifier of a building within a run.
///
/// Ordering is lexicographic and is the tie-break order used by every
/// neighbour query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(pub String);

impl BuildingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BuildingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BuildingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Coordinate Reference System identified by EPSG code
///
/// Carried through untouched; all computations assume a projected CRS in
/// which Euclidean distances are meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// ETRS89 / LAEA Europe (EPSG:3035)
    pub fn etrs89_laea() -> Self {
        Self::new(3035, "ETRS89 / LAEA Europe")
    }
}

/// A building footprint as delivered by ingestion.
///
/// The exterior ring is expected to be closed with at least 3 distinct
/// vertices, and holes to lie inside the exterior. The normalizer checks
/// these expectations instead of trusting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    pub id: BuildingId,
    pub exterior: Vec<[f64; 2]>,
    #[serde(default)]
    pub interiors: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub crs: Option<Crs>,
}

impl PolygonRecord {
    /// Create a record without holes
    pub fn new(id: impl Into<BuildingId>, exterior: Vec<[f64; 2]>) -> Self {
        Self { id: id.into(), exterior, interiors: Vec::new(), crs: None }
    }

    /// Add an interior ring
    pub fn with_hole(mut self, ring: Vec<[f64; 2]>) -> Self {
        self.interiors.push(ring);
        self
    }

    /// Attach a CRS tag
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Axis-aligned rectangle with its lower-left corner at `(x, y)`
    pub fn rectangle(id: impl Into<BuildingId>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(
            id,
            vec![[x, y], [x + width, y], [x + width, y + height], [x, y + height], [x, y]],
        )
    }

    /// Total number of coordinates over all rings
    pub fn coordinate_count(&self) -> usize {
        self.exterior.len() + self.interiors.iter().map(Vec::len).sum::<usize>()
    }
}
