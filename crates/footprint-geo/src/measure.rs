//! Planar measurements on rings and polygons.
//!
//! All functions assume a projected CRS: lengths and areas are Euclidean in
//! the units of the input coordinates.

use geo::{Coord, Euclidean, Length, LineString, MultiPolygon, Polygon};

/// Signed area of a closed ring via the shoelace formula
///
/// Positive for counter-clockwise rings. Coordinates are taken relative to
/// the first vertex so large projected offsets keep their precision.
pub fn ring_signed_area(ring: &LineString<f64>) -> f64 {
    let Some(&origin) = ring.0.first() else {
        return 0.0;
    };
    ring.lines()
        .map(|line| {
            let (start, end) = (line.start - origin, line.end - origin);
            start.x * end.y - end.x * start.y
        })
        .sum::<f64>()
        / 2.0
}

/// Sum of the edge lengths of a ring
pub fn ring_length(ring: &LineString<f64>) -> f64 {
    Euclidean.length(ring)
}

/// Exterior area minus hole areas
pub fn polygon_area(polygon: &Polygon<f64>) -> f64 {
    let holes: f64 = polygon.interiors().iter().map(|ring| ring_signed_area(ring).abs()).sum();
    ring_signed_area(polygon.exterior()).abs() - holes
}

pub fn area(shape: &MultiPolygon<f64>) -> f64 {
    shape.iter().map(polygon_area).sum()
}

/// Exterior plus hole edge lengths over all parts
pub fn perimeter(shape: &MultiPolygon<f64>) -> f64 {
    shape
        .iter()
        .map(|polygon| {
            ring_length(polygon.exterior())
                + polygon.interiors().iter().map(ring_length).sum::<f64>()
        })
        .sum()
}

/// Ring vertices without consecutive duplicates and without the closing coordinate
pub fn distinct_vertices(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut vertices: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        if vertices.last() != Some(coord) {
            vertices.push(*coord);
        }
    }
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_square_measurements() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        assert_eq!(ring_signed_area(square.exterior()), 100.0);
        assert_eq!(ring_length(square.exterior()), 40.0);
    }

    #[test]
    fn test_clockwise_ring_is_negative() {
        let ring = LineString::from(vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (0.0, 0.0)]);
        assert_eq!(ring_signed_area(&ring), -4.0);
    }

    #[test]
    fn test_hole_is_subtracted() {
        let shape = MultiPolygon::new(vec![polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 2.0, y: 4.0), (x: 4.0, y: 4.0), (x: 4.0, y: 2.0)]],
        )]);
        assert_eq!(area(&shape), 96.0);
        assert_eq!(perimeter(&shape), 48.0);
    }

    #[test]
    fn test_distinct_vertices() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(distinct_vertices(&ring).len(), 3);
    }

    #[test]
    fn test_area_far_from_origin() {
        let (x, y) = (1e9 + 0.25, -3e9);
        let ring = LineString::from(vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0), (x, y)]);
        assert_eq!(ring_signed_area(&ring), 1.0);
        assert_eq!(ring_signed_area(&LineString::new(vec![])), 0.0);
    }
}
