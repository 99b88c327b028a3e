//! Merging of per-building results into table rows.

use footprint_core::models::{
    BlockFeatures, BuildingId, FeatureTableRow, IntrinsicFeatures, RelationalFeatures, RowStatus,
};
use footprint_core::GeometryError;

/// Build the row of one building
///
/// A failed normalization yields a `Failed` row with every feature
/// unavailable and the reason recorded. Otherwise the row is `Partial` when
/// any value is unavailable and `Ok` when none is.
pub fn assemble(
    id: BuildingId,
    intrinsic: Result<IntrinsicFeatures, GeometryError>,
    relational: RelationalFeatures,
    block: BlockFeatures,
) -> FeatureTableRow {
    match intrinsic {
        Err(err) => failed(id, &err),
        Ok(intrinsic) => {
            let mut row = FeatureTableRow {
                id,
                status: RowStatus::Ok,
                intrinsic,
                relational,
                block,
                failure: None,
            };
            if row.unavailable_count() > 0 {
                row.status = RowStatus::Partial;
            }
            row
        }
    }
}

/// Row for a building whose geometry was rejected
pub fn failed(id: BuildingId, err: &GeometryError) -> FeatureTableRow {
    let reason = err.to_string();
    FeatureTableRow {
        id,
        status: RowStatus::Failed,
        intrinsic: IntrinsicFeatures::unavailable(&reason),
        relational: RelationalFeatures::unavailable(&reason),
        block: BlockFeatures::unavailable(&reason),
        failure: Some(reason),
    }
}
