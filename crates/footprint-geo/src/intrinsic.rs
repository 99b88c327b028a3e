//! Per-polygon shape descriptors.
//!
//! Every descriptor is computed on its own; a failure in one yields an
//! unavailable value for that descriptor only.

use std::f64::consts::PI;

use crate::measure;
use crate::models::NormalizedGeometry;
use footprint_core::models::{FeatureValue, IntrinsicFeature, IntrinsicFeatures};
use footprint_core::FeatureError;
use geo::{ConvexHull, Coord, Distance, Euclidean, MinimumRotatedRect};

/// Interior angles at or below this count as a corner.
const CORNER_MAX_ANGLE_DEGREES: f64 = 170.0;

type Descriptor = Result<f64, FeatureError>;

/// Compute all intrinsic descriptors of a geometry
pub fn extract(geometry: &NormalizedGeometry) -> IntrinsicFeatures {
    let area = area(geometry);
    let perimeter = perimeter(geometry);
    let rect = min_rect_sides(geometry);

    IntrinsicFeatures {
        compactness: value(compactness(&area, &perimeter)),
        elongation: value(elongation(&rect)),
        orientation: value(orientation(&rect)),
        convexity: value(convexity(geometry, &area)),
        phi: value(phi(geometry, &area)),
        longest_axis_length: value(longest_axis_length(geometry)),
        corners: value(corners(geometry)),
        hole_count: value(Ok(hole_count(geometry))),
        area: value(area),
        perimeter: value(perimeter),
    }
}

/// Compute a single descriptor
pub fn descriptor(geometry: &NormalizedGeometry, feature: IntrinsicFeature) -> FeatureValue {
    let result = match feature {
        IntrinsicFeature::Area => area(geometry),
        IntrinsicFeature::Perimeter => perimeter(geometry),
        IntrinsicFeature::Compactness => compactness(&area(geometry), &perimeter(geometry)),
        IntrinsicFeature::Elongation => elongation(&min_rect_sides(geometry)),
        IntrinsicFeature::Orientation => orientation(&min_rect_sides(geometry)),
        IntrinsicFeature::Convexity => convexity(geometry, &area(geometry)),
        IntrinsicFeature::Phi => phi(geometry, &area(geometry)),
        IntrinsicFeature::LongestAxisLength => longest_axis_length(geometry),
        IntrinsicFeature::Corners => corners(geometry),
        IntrinsicFeature::HoleCount => Ok(hole_count(geometry)),
    };
    value(result)
}

fn value(result: Descriptor) -> FeatureValue {
    FeatureValue::from_result(result)
}

fn finite(feature: IntrinsicFeature, value: f64) -> Descriptor {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeatureError::unavailable(feature.name(), format!("non-finite value {}", value)))
    }
}

fn area(geometry: &NormalizedGeometry) -> Descriptor {
    finite(IntrinsicFeature::Area, measure::area(geometry.shape()))
}

fn perimeter(geometry: &NormalizedGeometry) -> Descriptor {
    finite(IntrinsicFeature::Perimeter, measure::perimeter(geometry.shape()))
}

/// 4π·area / perimeter²
fn compactness(area: &Descriptor, perimeter: &Descriptor) -> Descriptor {
    let feature = IntrinsicFeature::Compactness;
    let (area, perimeter) = both(feature, area, perimeter)?;
    if perimeter <= 0.0 {
        return Err(FeatureError::unavailable(feature.name(), "zero perimeter"));
    }
    finite(feature, 4.0 * PI * area / (perimeter * perimeter))
}

/// Side lengths of the minimum rotated rectangle, long side first, with the
/// long side's direction vector
struct RectSides {
    long: f64,
    short: f64,
    direction: (f64, f64),
}

fn min_rect_sides(geometry: &NormalizedGeometry) -> Result<RectSides, FeatureError> {
    let rect = geometry.shape().minimum_rotated_rect().ok_or_else(|| {
        FeatureError::unavailable("minimum_rotated_rect", "no minimum rotated rectangle")
    })?;

    let corners: Vec<Coord<f64>> = rect.exterior().coords().copied().collect();
    if corners.len() < 3 {
        return Err(FeatureError::unavailable("minimum_rotated_rect", "rectangle has no sides"));
    }

    let (a, b, c) = (corners[0], corners[1], corners[2]);
    let first = Euclidean.distance(a, b);
    let second = Euclidean.distance(b, c);

    let sides = if first >= second {
        RectSides { long: first, short: second, direction: (b.x - a.x, b.y - a.y) }
    } else {
        RectSides { long: second, short: first, direction: (c.x - b.x, c.y - b.y) }
    };
    Ok(sides)
}

/// Short side over long side of the minimum rotated rectangle, in (0, 1]
fn elongation(rect: &Result<RectSides, FeatureError>) -> Descriptor {
    let feature = IntrinsicFeature::Elongation;
    let rect = rect.as_ref().map_err(|e| rename(feature, e))?;
    if rect.long <= 0.0 {
        return Err(FeatureError::unavailable(feature.name(), "zero-length rectangle"));
    }
    finite(feature, rect.short / rect.long)
}

/// Direction of the long side of the minimum rotated rectangle in degrees, in [0, 180)
fn orientation(rect: &Result<RectSides, FeatureError>) -> Descriptor {
    let feature = IntrinsicFeature::Orientation;
    let rect = rect.as_ref().map_err(|e| rename(feature, e))?;
    let (dx, dy) = rect.direction;
    finite(feature, normalize_angle(dy.atan2(dx).to_degrees()))
}

/// Fold an angle in degrees into [0, 180)
pub fn normalize_angle(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(180.0);
    if folded >= 180.0 - 1e-9 {
        0.0
    } else {
        folded
    }
}

/// Area over convex hull area, in (0, 1]
fn convexity(geometry: &NormalizedGeometry, area: &Descriptor) -> Descriptor {
    let feature = IntrinsicFeature::Convexity;
    let area = area.as_ref().map_err(|e| rename(feature, e))?;
    let hull = geometry.shape().convex_hull();
    let hull_area = measure::polygon_area(&hull);
    if hull_area <= 0.0 {
        return Err(FeatureError::unavailable(feature.name(), "zero convex hull area"));
    }
    finite(feature, (area / hull_area).min(1.0))
}

/// Area over the area of the centroid-centred circle reaching the farthest exterior vertex
fn phi(geometry: &NormalizedGeometry, area: &Descriptor) -> Descriptor {
    let feature = IntrinsicFeature::Phi;
    let area = area.as_ref().map_err(|e| rename(feature, e))?;
    let centroid = geometry.centroid().0;
    let radius = geometry
        .shape()
        .iter()
        .flat_map(|polygon| polygon.exterior().coords())
        .map(|c| Euclidean.distance(centroid, *c))
        .fold(0.0, f64::max);
    if radius <= 0.0 {
        return Err(FeatureError::unavailable(feature.name(), "zero circumscribing radius"));
    }
    finite(feature, area / (PI * radius * radius))
}

/// Largest distance between two convex hull vertices
fn longest_axis_length(geometry: &NormalizedGeometry) -> Descriptor {
    let hull = geometry.shape().convex_hull();
    let vertices = measure::distinct_vertices(hull.exterior());

    let mut longest = 0.0_f64;
    for (i, a) in vertices.iter().enumerate() {
        for b in &vertices[i + 1..] {
            longest = longest.max(Euclidean.distance(*a, *b));
        }
    }
    finite(IntrinsicFeature::LongestAxisLength, longest)
}

/// Exterior vertices whose interior angle is at most 170 degrees
fn corners(geometry: &NormalizedGeometry) -> Descriptor {
    let mut count = 0usize;
    for polygon in geometry.shape() {
        let vertices = measure::distinct_vertices(polygon.exterior());
        let n = vertices.len();
        for i in 0..n {
            let prev = vertices[(i + n - 1) % n];
            let here = vertices[i];
            let next = vertices[(i + 1) % n];
            let angle = vertex_angle(prev, here, next);
            if angle <= CORNER_MAX_ANGLE_DEGREES {
                count += 1;
            }
        }
    }
    Ok(count as f64)
}

/// Unsigned angle at `here` between the edges to `prev` and `next`, in degrees
fn vertex_angle(prev: Coord<f64>, here: Coord<f64>, next: Coord<f64>) -> f64 {
    let (ax, ay) = (prev.x - here.x, prev.y - here.y);
    let (bx, by) = (next.x - here.x, next.y - here.y);
    let cross = ax * by - ay * bx;
    let dot = ax * bx + ay * by;
    cross.abs().atan2(dot).to_degrees()
}

fn hole_count(geometry: &NormalizedGeometry) -> f64 {
    geometry.shape().iter().map(|polygon| polygon.interiors().len()).sum::<usize>() as f64
}

fn both(feature: IntrinsicFeature, a: &Descriptor, b: &Descriptor) -> Result<(f64, f64), FeatureError> {
    let a = a.as_ref().map_err(|e| rename(feature, e))?;
    let b = b.as_ref().map_err(|e| rename(feature, e))?;
    Ok((*a, *b))
}

/// Re-attribute an upstream failure to the dependent feature
fn rename(feature: IntrinsicFeature, err: &FeatureError) -> FeatureError {
    let FeatureError::Unavailable { feature: upstream, reason } = err;
    FeatureError::unavailable(feature.name(), format!("{} unavailable: {}", upstream, reason))
}
