//! Neighbour-dependent features of one building.

use footprint_core::models::{
    BuildingId, FeatureValue, IntrinsicFeature, RelationalConfig, RelationalFeatures,
};
use footprint_geo::{intrinsic, measure, spatial, Neighbor, NormalizedGeometry, SpatialIndex};

/// Access to the geometries and intrinsic values of a run
pub trait NeighborLookup {
    fn geometry(&self, id: &BuildingId) -> Option<&NormalizedGeometry>;

    /// Intrinsic feature of a neighbour, computed from its geometry unless overridden
    fn intrinsic_value(&self, id: &BuildingId, feature: IntrinsicFeature) -> FeatureValue {
        match self.geometry(id) {
            Some(geometry) => intrinsic::descriptor(geometry, feature),
            None => FeatureValue::unavailable(format!("unknown building {}", id)),
        }
    }
}

impl NeighborLookup for SpatialIndex<'_> {
    fn geometry(&self, id: &BuildingId) -> Option<&NormalizedGeometry> {
        SpatialIndex::geometry(self, id)
    }
}

/// Relational features plus the buildings found in contact
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalOutcome {
    pub features: RelationalFeatures,
    /// Ids with a positive shared boundary length, ascending
    pub touching: Vec<BuildingId>,
    /// Ids whose footprint lies within the boundary tolerance, corner contact included, ascending
    pub contacts: Vec<BuildingId>,
}

impl RelationalOutcome {
    fn unavailable(reason: &str) -> Self {
        Self {
            features: RelationalFeatures::unavailable(reason),
            touching: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

/// Compute the relational features of `id`
///
/// When no other building lies within the radius box around the centroid,
/// every feature is unavailable.
pub fn extract<L>(
    id: &BuildingId,
    index: &SpatialIndex<'_>,
    lookup: &L,
    config: &RelationalConfig,
) -> RelationalOutcome
where
    L: NeighborLookup + ?Sized,
{
    let Some(geometry) = lookup.geometry(id) else {
        return RelationalOutcome::unavailable("building not in spatial index");
    };

    let neighborhood = spatial::square_around(geometry.centroid_coords(), config.radius);
    let in_radius = index.query_range(&neighborhood).into_iter().filter(|other| other != id).count();
    if in_radius == 0 {
        return RelationalOutcome::unavailable("no neighbours within radius");
    }

    let knn = index.query_knn(id, config.k.max(1));
    let knn_set = &knn[..config.k.min(knn.len())];

    let Contacts { shared, touching, contacts } =
        find_contacts(id, geometry, index, lookup, config.boundary_tolerance);
    let perimeter = measure::perimeter(geometry.shape());

    let features = RelationalFeatures {
        nearest_neighbor_distance: match knn.first() {
            Some(nearest) => FeatureValue::from_f64(nearest.distance),
            None => FeatureValue::unavailable("no other building indexed"),
        },
        mean_knn_distance: mean_distance(knn_set),
        neighbor_count: FeatureValue::Numeric(in_radius as f64),
        local_density: FeatureValue::from_f64(in_radius as f64 / config.neighborhood_area()),
        shared_boundary_ratio: FeatureValue::from_f64((shared / perimeter).clamp(0.0, 1.0)),
        shared_wall_length: FeatureValue::from_f64(shared),
        touches: FeatureValue::Numeric(touching.len() as f64),
        neighbor_aggregate: aggregate(knn_set, lookup, config),
    };

    RelationalOutcome { features, touching, contacts }
}

fn mean_distance(neighbors: &[Neighbor]) -> FeatureValue {
    if neighbors.is_empty() {
        return FeatureValue::unavailable("k is 0");
    }
    let total: f64 = neighbors.iter().map(|n| n.distance).sum();
    FeatureValue::from_f64(total / neighbors.len() as f64)
}

fn aggregate<L>(neighbors: &[Neighbor], lookup: &L, config: &RelationalConfig) -> FeatureValue
where
    L: NeighborLookup + ?Sized,
{
    let values: Vec<f64> = neighbors
        .iter()
        .filter_map(|n| lookup.intrinsic_value(&n.id, config.aggregate_feature).as_f64())
        .collect();

    match config.aggregation.apply(&values) {
        Some(value) => FeatureValue::from_f64(value),
        None => FeatureValue::unavailable(format!(
            "no neighbour {} available",
            config.aggregate_feature.name()
        )),
    }
}

/// Boundary shared with nearby buildings and the buildings in contact
struct Contacts {
    shared: f64,
    touching: Vec<BuildingId>,
    contacts: Vec<BuildingId>,
}

fn find_contacts<L>(
    id: &BuildingId,
    geometry: &NormalizedGeometry,
    index: &SpatialIndex<'_>,
    lookup: &L,
    tolerance: f64,
) -> Contacts
where
    L: NeighborLookup + ?Sized,
{
    let reach = spatial::expand_rect(&geometry.bbox(), tolerance);

    let mut found = Contacts { shared: 0.0, touching: Vec::new(), contacts: Vec::new() };
    for other_id in index.query_range(&reach) {
        if &other_id == id {
            continue;
        }
        let Some(other) = lookup.geometry(&other_id) else {
            continue;
        };
        if spatial::edge_distance(geometry, other) > tolerance {
            continue;
        }
        let length = spatial::shared_boundary_length(geometry, other, tolerance);
        if length > 0.0 {
            found.shared += length;
            found.touching.push(other_id.clone());
        }
        found.contacts.push(other_id);
    }

    found
}
