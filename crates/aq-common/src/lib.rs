//! Common types and utilities shared across the air-quality surface workspace.

pub mod bbox;
pub mod boundary;
pub mod category;
pub mod error;
pub mod station;

pub use bbox::BoundingBox;
pub use boundary::RegionBoundary;
pub use category::AqiCategory;
pub use error::{SurfaceError, SurfaceResult};
pub use station::{GeoPoint, StationBatch, StationReading, MIN_STATIONS};
