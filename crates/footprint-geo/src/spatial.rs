//! Pairwise spatial relations between normalized geometries.

use crate::measure;
use crate::models::NormalizedGeometry;
use footprint_core::models::DistanceMetric;
use geo::{BoundingRect, Coord, Distance, Euclidean, Line, Rect};

/// Check if two bounding boxes intersect
pub fn bounding_boxes_intersect(bbox1: &Rect<f64>, bbox2: &Rect<f64>) -> bool {
    // Two rectangles intersect if they overlap in both x and y dimensions
    let x_overlap = bbox1.min().x <= bbox2.max().x && bbox1.max().x >= bbox2.min().x;
    let y_overlap = bbox1.min().y <= bbox2.max().y && bbox1.max().y >= bbox2.min().y;

    x_overlap && y_overlap
}

/// Grow a bounding box by `margin` on every side
pub fn expand_rect(rect: &Rect<f64>, margin: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: rect.min().x - margin, y: rect.min().y - margin },
        Coord { x: rect.max().x + margin, y: rect.max().y + margin },
    )
}

/// Square of half side `radius` centred on `center`
pub fn square_around(center: [f64; 2], radius: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: center[0] - radius, y: center[1] - radius },
        Coord { x: center[0] + radius, y: center[1] + radius },
    )
}

/// Euclidean distance between centroids
pub fn centroid_distance(a: &NormalizedGeometry, b: &NormalizedGeometry) -> f64 {
    Euclidean.distance(a.centroid().0, b.centroid().0)
}

/// Minimum Euclidean distance between the two shapes; 0 when they touch or overlap
pub fn edge_distance(a: &NormalizedGeometry, b: &NormalizedGeometry) -> f64 {
    Euclidean.distance(a.shape(), b.shape())
}

/// Distance between two geometries under the given metric
pub fn distance(a: &NormalizedGeometry, b: &NormalizedGeometry, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Centroid => centroid_distance(a, b),
        DistanceMetric::Edge => edge_distance(a, b),
    }
}

/// All non-degenerate edges of every ring
pub fn boundary_lines(geometry: &NormalizedGeometry) -> Vec<Line<f64>> {
    geometry
        .shape()
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors().iter()))
        .flat_map(|ring| ring.lines())
        .filter(|line| line.start != line.end)
        .collect()
}

/// Length of `a`'s boundary lying within `tolerance` of `b`'s boundary
///
/// Two edges share a wall when both endpoints of the other edge are within
/// `tolerance` of this edge's supporting line; the shared length is the
/// overlap of their projections onto this edge.
pub fn shared_boundary_length(a: &NormalizedGeometry, b: &NormalizedGeometry, tolerance: f64) -> f64 {
    let lines_b = boundary_lines(b);
    let shared: f64 = boundary_lines(a)
        .iter()
        .map(|la| {
            let reach = expand_rect(&la.bounding_rect(), tolerance);
            lines_b
                .iter()
                .filter(|lb| bounding_boxes_intersect(&reach, &lb.bounding_rect()))
                .map(|lb| collinear_overlap(la, lb, tolerance))
                .sum::<f64>()
        })
        .sum();

    shared.min(measure::perimeter(a.shape()))
}

/// Overlap length of `b` projected onto `a`, when `b` runs along `a`
fn collinear_overlap(a: &Line<f64>, b: &Line<f64>, tolerance: f64) -> f64 {
    let length = Euclidean.distance(a.start, a.end);
    if length == 0.0 {
        return 0.0;
    }
    let (ux, uy) = ((a.end.x - a.start.x) / length, (a.end.y - a.start.y) / length);

    let offset = |p: Coord<f64>| ((p.x - a.start.x) * uy - (p.y - a.start.y) * ux).abs();
    if offset(b.start) > tolerance || offset(b.end) > tolerance {
        return 0.0;
    }

    let along = |p: Coord<f64>| (p.x - a.start.x) * ux + (p.y - a.start.y) * uy;
    let (t0, t1) = (along(b.start), along(b.end));
    let lo = t0.min(t1).max(0.0);
    let hi = t0.max(t1).min(length);
    (hi - lo).max(0.0)
}
