//! Validation and repair of raw polygon records.

use crate::measure;
use crate::models::{ring_to_line_string, NormalizedGeometry};
use footprint_core::models::PolygonRecord;
use footprint_core::GeometryError;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::orient::{Direction, Orient};
use geo::{BooleanOps, BoundingRect, Centroid, Contains, Coord, Line, LineString, MultiPolygon, Polygon, Rect};

/// Parts smaller than this fraction of the squared bbox diagonal count as zero area.
const RELATIVE_AREA_EPSILON: f64 = 1e-12;

/// Normalize a polygon record into a geometry every feature stage can trust
///
/// Rings are closed if needed and holes that remove no area are dropped.
/// Self-intersections are resolved by a union of the polygon with itself,
/// and winding is set to counter-clockwise exteriors with clockwise holes.
pub fn normalize(record: &PolygonRecord) -> Result<NormalizedGeometry, GeometryError> {
    check_finite(record)?;

    let exterior = close_ring(ring_to_line_string(&record.exterior));
    let distinct = measure::distinct_vertices(&exterior).len();
    if distinct < 3 {
        return Err(GeometryError::degenerate(format!(
            "exterior has {} distinct vertices, at least 3 required",
            distinct
        )));
    }

    let exterior_bounds = exterior
        .bounding_rect()
        .ok_or_else(|| GeometryError::degenerate("exterior has no bounding box"))?;

    let interiors = screen_holes(record, &exterior);
    let polygon = Polygon::new(exterior, interiors);
    let scale = diagonal_squared(&exterior_bounds);

    let (shape, repaired) = if is_self_intersecting(&polygon) {
        let repaired = repair(&polygon, scale)?;
        tracing::debug!(id = %record.id, parts = repaired.0.len(), "Repaired self-intersecting polygon");
        (repaired, true)
    } else {
        if measure::polygon_area(&polygon) <= RELATIVE_AREA_EPSILON * scale {
            return Err(GeometryError::degenerate("polygon has zero area"));
        }
        (MultiPolygon::new(vec![polygon]), false)
    };

    let shape = shape.orient(Direction::Default);

    if measure::perimeter(&shape) <= f64::EPSILON * scale.sqrt() {
        return Err(GeometryError::degenerate("polygon has zero perimeter"));
    }

    let centroid = shape
        .centroid()
        .ok_or_else(|| GeometryError::degenerate("centroid is undefined"))?;
    let bbox = shape
        .bounding_rect()
        .ok_or_else(|| GeometryError::degenerate("bounding box is undefined"))?;

    Ok(NormalizedGeometry::new(
        record.id.clone(),
        shape,
        centroid,
        bbox,
        repaired,
        record.crs.clone(),
    ))
}

fn check_finite(record: &PolygonRecord) -> Result<(), GeometryError> {
    let all_finite = std::iter::once(&record.exterior)
        .chain(record.interiors.iter())
        .flatten()
        .all(|c| c[0].is_finite() && c[1].is_finite());

    if all_finite {
        Ok(())
    } else {
        Err(GeometryError::degenerate("coordinates must be finite"))
    }
}

fn close_ring(mut ring: LineString<f64>) -> LineString<f64> {
    ring.close();
    ring
}

/// Holes that cut area out of the exterior, in record order
///
/// A hole must lie inside the exterior ring. A hole inside another hole
/// removes nothing more and is dropped; of two identical holes the first is kept.
fn screen_holes(record: &PolygonRecord, exterior: &LineString<f64>) -> Vec<LineString<f64>> {
    let shell = Polygon::new(exterior.clone(), vec![]);

    let candidates: Vec<(usize, Polygon<f64>)> = record
        .interiors
        .iter()
        .enumerate()
        .filter_map(|(i, ring)| {
            let ring = close_ring(ring_to_line_string(ring));
            if measure::distinct_vertices(&ring).len() < 3 {
                tracing::debug!(id = %record.id, hole = i, "Dropping degenerate hole");
                return None;
            }
            let hole = Polygon::new(ring, vec![]);
            if !shell.contains(&hole) {
                tracing::debug!(id = %record.id, hole = i, "Dropping hole outside exterior");
                return None;
            }
            Some((i, hole))
        })
        .collect();

    candidates
        .iter()
        .enumerate()
        .filter(|(a, (i, hole))| {
            let nested = candidates.iter().enumerate().any(|(b, (_, other))| {
                b != *a && other.contains(hole) && (b < *a || !hole.contains(other))
            });
            if nested {
                tracing::debug!(id = %record.id, hole = *i, "Dropping hole nested in another hole");
            }
            !nested
        })
        .map(|(_, (_, hole))| hole.exterior().clone())
        .collect()
}

fn diagonal_squared(rect: &Rect<f64>) -> f64 {
    rect.width() * rect.width() + rect.height() * rect.height()
}

/// Whether any two edges of the polygon's rings cross or overlap
///
/// Adjacent edges of a ring may share their common vertex but must not fold
/// back onto each other.
pub fn is_self_intersecting(polygon: &Polygon<f64>) -> bool {
    let rings: Vec<Vec<Line<f64>>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .map(|ring| ring.lines().filter(|line| line.start != line.end).collect())
        .collect();

    for (ri, ring_a) in rings.iter().enumerate() {
        for (rj, ring_b) in rings.iter().enumerate().skip(ri) {
            for (i, a) in ring_a.iter().enumerate() {
                let start = if ri == rj { i + 1 } else { 0 };
                for (j, b) in ring_b.iter().enumerate().skip(start) {
                    let adjacent = ri == rj && (j == i + 1 || (i == 0 && j + 1 == ring_a.len()));
                    if segments_conflict(a, b, adjacent) {
                        return true;
                    }
                }
            }
        }
    }

    false
}

fn segments_conflict(a: &Line<f64>, b: &Line<f64>, adjacent: bool) -> bool {
    match line_intersection(*a, *b) {
        None => false,
        Some(LineIntersection::Collinear { .. }) => true,
        Some(LineIntersection::SinglePoint { intersection, .. }) => {
            !adjacent || !is_shared_endpoint(intersection, a, b)
        }
    }
}

fn is_shared_endpoint(point: Coord<f64>, a: &Line<f64>, b: &Line<f64>) -> bool {
    (point == a.start || point == a.end) && (point == b.start || point == b.end)
}

/// Resolve self-intersections with a union of the polygon with itself
fn repair(polygon: &Polygon<f64>, scale: f64) -> Result<MultiPolygon<f64>, GeometryError> {
    let unioned = polygon.union(polygon);

    let parts: Vec<Polygon<f64>> = unioned
        .into_iter()
        .filter(|part| measure::polygon_area(part) > RELATIVE_AREA_EPSILON * scale)
        .collect();

    if parts.is_empty() {
        return Err(GeometryError::unrepairable("self-union produced an empty polygon"));
    }

    Ok(MultiPolygon::new(parts))
}
