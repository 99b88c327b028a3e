//! Geometry models for footprint-geo.
//!
//! Conversions between the coordinate arrays of `PolygonRecord` and the
//! `geo` crate types, and the normalized geometry every later stage reads.

use footprint_core::models::{BuildingId, Crs};
use geo::{Coord, LineString, MultiPolygon, Point, Rect};

/// Convert a coordinate ring to a geo::LineString
pub fn ring_to_line_string(ring: &[[f64; 2]]) -> LineString<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|c| Coord { x: c[0], y: c[1] }).collect();
    LineString::new(coords)
}

/// Convert a geo::LineString back to a coordinate ring
pub fn line_string_to_ring(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

/// A repaired, consistently wound building footprint
///
/// Exterior rings are counter-clockwise and holes clockwise. The shape is a
/// multipolygon because repairing a self-intersecting ring can split it
/// (a bowtie becomes two triangles). Only `normalize` constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGeometry {
    id: BuildingId,
    shape: MultiPolygon<f64>,
    centroid: Point<f64>,
    bbox: Rect<f64>,
    repaired: bool,
    crs: Option<Crs>,
}

impl NormalizedGeometry {
    pub(crate) fn new(
        id: BuildingId,
        shape: MultiPolygon<f64>,
        centroid: Point<f64>,
        bbox: Rect<f64>,
        repaired: bool,
        crs: Option<Crs>,
    ) -> Self {
        Self { id, shape, centroid, bbox, repaired, crs }
    }

    pub fn id(&self) -> &BuildingId {
        &self.id
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn centroid(&self) -> Point<f64> {
        self.centroid
    }

    pub fn centroid_coords(&self) -> [f64; 2] {
        [self.centroid.x(), self.centroid.y()]
    }

    pub fn bbox(&self) -> Rect<f64> {
        self.bbox
    }

    /// Whether self-intersections had to be resolved
    pub fn was_repaired(&self) -> bool {
        self.repaired
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Number of polygon parts (more than one only after repair)
    pub fn part_count(&self) -> usize {
        self.shape.0.len()
    }

    /// All rings as coordinate arrays, exterior first for each part
    pub fn rings(&self) -> Vec<Vec<[f64; 2]>> {
        self.shape
            .iter()
            .flat_map(|polygon| {
                std::iter::once(polygon.exterior()).chain(polygon.interiors().iter())
            })
            .map(line_string_to_ring)
            .collect()
    }
}
