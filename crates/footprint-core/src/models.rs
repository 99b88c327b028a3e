pub mod feature;
pub mod neighborhood;
pub mod record;
pub mod table;

pub use feature::{BlockFeatures, FeatureValue, IntrinsicFeature, IntrinsicFeatures, RelationalFeatures};
pub use neighborhood::{Aggregation, DistanceMetric, RelationalConfig};
pub use record::{BuildingId, Crs, PolygonRecord};
pub use table::{FeatureTable, FeatureTableRow, RowStatus, SCHEMA_VERSION};
