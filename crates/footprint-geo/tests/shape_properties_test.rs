//! Property tests for normalization and intrinsic descriptors
//!
//! These tests check invariants that must hold for any valid footprint:
//! non-negative area, compactness in (0, 1], scale invariance and
//! consistent winding.

use footprint_core::models::{FeatureValue, PolygonRecord};
use footprint_geo::measure::{self, ring_signed_area};
use footprint_geo::{intrinsic, normalize};
use proptest::prelude::*;

fn numeric(value: &FeatureValue) -> f64 {
    value.as_f64().expect("descriptor should be available")
}

/// Star-shaped polygon around the origin, simple by construction
fn star_polygon(radii: &[f64]) -> Vec<[f64; 2]> {
    let n = radii.len();
    let mut ring: Vec<[f64; 2]> = radii
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            [r * angle.cos(), r * angle.sin()]
        })
        .collect();
    ring.push(ring[0]);
    ring
}

proptest! {
    #[test]
    fn rectangle_descriptors_stay_in_range(
        x in -1000.0..1000.0f64,
        y in -1000.0..1000.0f64,
        w in 0.5..200.0f64,
        h in 0.5..200.0f64,
    ) {
        let geometry = normalize(&PolygonRecord::rectangle("r", x, y, w, h)).unwrap();
        let features = intrinsic::extract(&geometry);

        let area = numeric(&features.area);
        prop_assert!((area - w * h).abs() <= 1e-6 * w * h);

        let compactness = numeric(&features.compactness);
        prop_assert!(compactness > 0.0 && compactness <= 1.0);

        let elongation = numeric(&features.elongation);
        prop_assert!(elongation > 0.0 && elongation <= 1.0 + 1e-9);

        let orientation = numeric(&features.orientation);
        prop_assert!((0.0..180.0).contains(&orientation));
    }

    #[test]
    fn star_polygons_are_valid(radii in prop::collection::vec(1.0..50.0f64, 3..24)) {
        let record = PolygonRecord::new("star", star_polygon(&radii));
        let geometry = normalize(&record).unwrap();
        let features = intrinsic::extract(&geometry);

        prop_assert!(numeric(&features.area) > 0.0);
        let compactness = numeric(&features.compactness);
        prop_assert!(compactness > 0.0 && compactness <= 1.0);
        let convexity = numeric(&features.convexity);
        prop_assert!(convexity > 0.0 && convexity <= 1.0 + 1e-9);

        for polygon in geometry.shape().iter() {
            prop_assert!(ring_signed_area(polygon.exterior()) > 0.0);
        }
    }

    #[test]
    fn compactness_is_scale_invariant(
        radii in prop::collection::vec(1.0..50.0f64, 3..16),
        scale in 0.1..100.0f64,
    ) {
        let ring = star_polygon(&radii);
        let scaled: Vec<[f64; 2]> = ring.iter().map(|c| [c[0] * scale, c[1] * scale]).collect();

        let small = normalize(&PolygonRecord::new("a", ring)).unwrap();
        let large = normalize(&PolygonRecord::new("b", scaled)).unwrap();

        let a = numeric(&intrinsic::extract(&small).compactness);
        let b = numeric(&intrinsic::extract(&large).compactness);
        prop_assert!((a - b).abs() < 1e-9);

        let ratio = measure::area(large.shape()) / measure::area(small.shape());
        prop_assert!((ratio - scale * scale).abs() <= 1e-6 * scale * scale);
    }
}

#[test]
fn test_scenario_square_areas_and_compactness() {
    let small = normalize(&PolygonRecord::rectangle("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
    let other = normalize(&PolygonRecord::rectangle("b", 50.0, 0.0, 10.0, 10.0)).unwrap();
    let large = normalize(&PolygonRecord::rectangle("c", 0.0, 50.0, 20.0, 20.0)).unwrap();

    let features: Vec<_> = [&small, &other, &large].iter().map(|g| intrinsic::extract(g)).collect();
    let areas: Vec<f64> = features.iter().map(|f| numeric(&f.area)).collect();
    assert_eq!(areas, vec![100.0, 100.0, 400.0]);

    let compactness = numeric(&features[0].compactness);
    assert!((compactness - numeric(&features[2].compactness)).abs() < 1e-12);
    assert!((compactness - std::f64::consts::PI / 4.0).abs() < 1e-12);
}
