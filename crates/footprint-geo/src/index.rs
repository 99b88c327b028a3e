use crate::models::NormalizedGeometry;
use crate::spatial;
use footprint_core::models::{BuildingId, DistanceMetric};
use footprint_core::IndexError;
use geo::{Coord, Distance, Euclidean, Point, Rect};
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Bounding box of one building with its slot in the geometry arena
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Building identifier
    pub id: BuildingId,

    /// Position of the geometry in the slice the index was built from
    pub slot: usize,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexEntry {
    fn new(slot: usize, geometry: &NormalizedGeometry) -> Self {
        let bbox = geometry.bbox();
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        Self { id: geometry.id().clone(), slot, envelope }
    }

    pub fn bbox(&self) -> Rect<f64> {
        let (lower, upper) = (self.envelope.lower(), self.envelope.upper());
        Rect::new(Coord { x: lower[0], y: lower[1] }, Coord { x: upper[0], y: upper[1] })
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// One result of a nearest-neighbour query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub id: BuildingId,
    #[serde(skip)]
    pub slot: usize,
    pub distance: f64,
}

type CentroidPoint = GeomWithData<[f64; 2], usize>;

/// Read-only spatial index over the normalized geometries of one run
///
/// Holds two R-trees bulk-loaded once: bounding boxes for range queries and
/// centroids for nearest-neighbour queries. Geometries stay in the caller's
/// slice; entries refer to them by slot.
pub struct SpatialIndex<'a> {
    geometries: &'a [NormalizedGeometry],
    slots: HashMap<BuildingId, usize>,
    boxes: RTree<IndexEntry>,
    centroids: RTree<CentroidPoint>,
    entries: Vec<IndexEntry>,
    metric: DistanceMetric,
    /// Largest centroid-to-vertex distance of any geometry
    max_extent: f64,
}

impl<'a> SpatialIndex<'a> {
    /// Build the index over `geometries`
    ///
    /// Fails on empty input or duplicate identifiers.
    pub fn build(
        geometries: &'a [NormalizedGeometry],
        metric: DistanceMetric,
    ) -> Result<Self, IndexError> {
        if geometries.is_empty() {
            return Err(IndexError::BuildFailure {
                reason: "no geometries to index".to_string(),
            });
        }

        let mut slots = HashMap::with_capacity(geometries.len());
        for (slot, geometry) in geometries.iter().enumerate() {
            if slots.insert(geometry.id().clone(), slot).is_some() {
                return Err(IndexError::BuildFailure {
                    reason: format!("duplicate building id {}", geometry.id()),
                });
            }
        }

        let entries: Vec<IndexEntry> = geometries
            .iter()
            .enumerate()
            .map(|(slot, geometry)| IndexEntry::new(slot, geometry))
            .collect();
        let centroids: Vec<CentroidPoint> = geometries
            .iter()
            .enumerate()
            .map(|(slot, geometry)| GeomWithData::new(geometry.centroid_coords(), slot))
            .collect();

        let max_extent = geometries.iter().map(extent).fold(0.0, f64::max);

        tracing::debug!(count = geometries.len(), ?metric, "Built spatial index");

        Ok(Self {
            geometries,
            slots,
            boxes: RTree::bulk_load(entries.clone()),
            centroids: RTree::bulk_load(centroids),
            entries,
            metric,
            max_extent,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn entry(&self, id: &BuildingId) -> Option<&IndexEntry> {
        self.slots.get(id).map(|&slot| &self.entries[slot])
    }

    pub fn geometry(&self, id: &BuildingId) -> Option<&'a NormalizedGeometry> {
        self.slots.get(id).map(|&slot| &self.geometries[slot])
    }

    /// Up to `k` nearest other buildings, nearest first, ties by ascending id
    ///
    /// Returns an empty list for `k == 0` or an unknown id.
    pub fn query_knn(&self, id: &BuildingId, k: usize) -> Vec<Neighbor> {
        let Some(&slot) = self.slots.get(id) else {
            return Vec::new();
        };
        let origin = &self.geometries[slot];

        match self.metric {
            DistanceMetric::Centroid => self.nearest(origin.centroid_coords(), 0.0, k, Some(slot), |g| {
                spatial::centroid_distance(origin, g)
            }),
            DistanceMetric::Edge => {
                let slack = extent(origin) + self.max_extent;
                self.nearest(origin.centroid_coords(), slack, k, Some(slot), |g| {
                    spatial::edge_distance(origin, g)
                })
            }
        }
    }

    /// Up to `k` nearest buildings to an arbitrary point
    ///
    /// Under the edge metric the distance is from the point to the footprint,
    /// 0 when the point lies inside it.
    pub fn query_knn_point(&self, point: [f64; 2], k: usize) -> Vec<Neighbor> {
        let at = Coord { x: point[0], y: point[1] };
        match self.metric {
            DistanceMetric::Centroid => {
                self.nearest(point, 0.0, k, None, |g| Euclidean.distance(at, g.centroid().0))
            }
            DistanceMetric::Edge => {
                let at = Point::from(at);
                self.nearest(point, self.max_extent, k, None, |g| Euclidean.distance(&at, g.shape()))
            }
        }
    }

    /// Ids of all buildings whose bounding box intersects `rect`
    pub fn query_range(&self, rect: &Rect<f64>) -> BTreeSet<BuildingId> {
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        self.boxes
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Walk centroids nearest-first until the k-th result can no longer change
    ///
    /// `slack` bounds how much closer a footprint can be than its centroid,
    /// so a candidate whose centroid distance minus `slack` exceeds the
    /// current k-th distance ends the walk.
    fn nearest<F>(
        &self,
        origin: [f64; 2],
        slack: f64,
        k: usize,
        exclude: Option<usize>,
        distance: F,
    ) -> Vec<Neighbor>
    where
        F: Fn(&NormalizedGeometry) -> f64,
    {
        if k == 0 {
            return Vec::new();
        }

        let mut found: Vec<Neighbor> = Vec::with_capacity(k.min(self.len()) + 1);
        for (point, distance_2) in self.centroids.nearest_neighbor_iter_with_distance_2(&origin) {
            let slot = point.data;
            if Some(slot) == exclude {
                continue;
            }
            if found.len() == k && distance_2.sqrt() - slack > found[k - 1].distance {
                break;
            }

            let geometry = &self.geometries[slot];
            found.push(Neighbor { id: geometry.id().clone(), slot, distance: distance(geometry) });
            found.sort_by(compare_neighbors);
            found.truncate(k);
        }

        found
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id))
}

/// Radius of the smallest centroid-centred disk holding every vertex
fn extent(geometry: &NormalizedGeometry) -> f64 {
    let centroid = geometry.centroid().0;
    geometry
        .shape()
        .iter()
        .flat_map(|polygon| polygon.exterior().coords())
        .map(|c| Euclidean.distance(centroid, *c))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use footprint_core::models::PolygonRecord;

    fn squares(specs: &[(&str, f64, f64, f64)]) -> Vec<NormalizedGeometry> {
        specs
            .iter()
            .map(|(id, x, y, size)| normalize(&PolygonRecord::rectangle(*id, *x, *y, *size, *size)).unwrap())
            .collect()
    }

    fn ids(neighbors: &[Neighbor]) -> Vec<&str> {
        neighbors.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_build_rejects_empty_and_duplicates() {
        assert!(SpatialIndex::build(&[], DistanceMetric::Centroid).is_err());

        let geometries = squares(&[("a", 0.0, 0.0, 1.0), ("a", 5.0, 0.0, 1.0)]);
        let result = SpatialIndex::build(&geometries, DistanceMetric::Centroid);
        assert!(matches!(result, Err(IndexError::BuildFailure { .. })));
    }

    #[test]
    fn test_knn_excludes_self_and_orders_by_distance() {
        let geometries = squares(&[
            ("a", 0.0, 0.0, 10.0),
            ("b", 20.0, 0.0, 10.0),
            ("c", 50.0, 0.0, 10.0),
        ]);
        let index = SpatialIndex::build(&geometries, DistanceMetric::Centroid).unwrap();

        let neighbors = index.query_knn(&BuildingId::from("a"), 5);
        assert_eq!(ids(&neighbors), vec!["b", "c"]);
        assert_eq!(neighbors[0].distance, 20.0);
        assert_eq!(neighbors[1].distance, 50.0);
    }

    #[test]
    fn test_knn_is_asymmetric() {
        // b's nearest is c, but a's nearest is b
        let geometries = squares(&[
            ("a", 0.0, 0.0, 1.0),
            ("b", 10.0, 0.0, 1.0),
            ("c", 14.0, 0.0, 1.0),
        ]);
        let index = SpatialIndex::build(&geometries, DistanceMetric::Centroid).unwrap();

        assert_eq!(ids(&index.query_knn(&BuildingId::from("a"), 1)), vec!["b"]);
        assert_eq!(ids(&index.query_knn(&BuildingId::from("b"), 1)), vec!["c"]);
    }

    #[test]
    fn test_knn_ties_break_by_id() {
        let geometries = squares(&[
            ("m", 0.0, 0.0, 2.0),
            ("z", 10.0, 0.0, 2.0),
            ("b", -10.0, 0.0, 2.0),
            ("k", 0.0, 10.0, 2.0),
        ]);
        let index = SpatialIndex::build(&geometries, DistanceMetric::Centroid).unwrap();

        let neighbors = index.query_knn(&BuildingId::from("m"), 2);
        assert_eq!(ids(&neighbors), vec!["b", "k"]);
    }

    #[test]
    fn test_knn_edge_cases() {
        let geometries = squares(&[("a", 0.0, 0.0, 1.0), ("b", 3.0, 0.0, 1.0)]);
        let index = SpatialIndex::build(&geometries, DistanceMetric::Centroid).unwrap();

        assert!(index.query_knn(&BuildingId::from("a"), 0).is_empty());
        assert_eq!(index.query_knn(&BuildingId::from("a"), 10).len(), 1);
        assert!(index.query_knn(&BuildingId::from("missing"), 3).is_empty());
    }

    #[test]
    fn test_edge_metric_prefers_closer_boundary() {
        // Large building whose centroid is far but whose wall is close
        let geometries = vec![
            normalize(&PolygonRecord::rectangle("origin", 0.0, 0.0, 2.0, 2.0)).unwrap(),
            normalize(&PolygonRecord::rectangle("big", 3.0, -50.0, 100.0, 100.0)).unwrap(),
            normalize(&PolygonRecord::rectangle("small", -12.0, 0.0, 2.0, 2.0)).unwrap(),
        ];

        let by_centroid = SpatialIndex::build(&geometries, DistanceMetric::Centroid).unwrap();
        assert_eq!(ids(&by_centroid.query_knn(&BuildingId::from("origin"), 1)), vec!["small"]);

        let by_edge = SpatialIndex::build(&geometries, DistanceMetric::Edge).unwrap();
        let nearest = by_edge.query_knn(&BuildingId::from("origin"), 1);
        assert_eq!(ids(&nearest), vec!["big"]);
        assert!((nearest[0].distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_knn_point() {
        let geometries = squares(&[("a", 0.0, 0.0, 2.0), ("b", 10.0, 0.0, 2.0)]);
        let index = SpatialIndex::build(&geometries, DistanceMetric::Edge).unwrap();

        let nearest = index.query_knn_point([1.0, 1.0], 2);
        assert_eq!(ids(&nearest), vec!["a", "b"]);
        assert_eq!(nearest[0].distance, 0.0);
        assert_eq!(nearest[1].distance, 9.0);
    }

    #[test]
    fn test_range_query() {
        let geometries = squares(&[
            ("a", 0.0, 0.0, 10.0),
            ("b", 10.0, 0.0, 10.0),
            ("c", 100.0, 100.0, 10.0),
        ]);
        let index = SpatialIndex::build(&geometries, DistanceMetric::Centroid).unwrap();

        let rect = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 11.0, y: 11.0 });
        let hits: Vec<String> = index.query_range(&rect).into_iter().map(|id| id.0).collect();
        assert_eq!(hits, vec!["a".to_string(), "b".to_string()]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.entry(&BuildingId::from("c")).map(|e| e.slot), Some(2));
        assert_eq!(index.geometry(&BuildingId::from("b")).map(|g| g.id().as_str()), Some("b"));
    }
}
