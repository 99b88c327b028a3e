//! Footprint Geo - Normalization, spatial indexing, and per-polygon descriptors
//!
//! This crate turns raw polygon records into normalized geometries, indexes
//! them for range and nearest-neighbour queries, and computes the intrinsic
//! shape descriptors of each building.

pub mod index;
pub mod intrinsic;
pub mod measure;
pub mod models;
pub mod normalize;
pub mod spatial;

pub use index::{IndexEntry, Neighbor, SpatialIndex};
pub use models::NormalizedGeometry;
pub use normalize::normalize;
