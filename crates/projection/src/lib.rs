//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.
//! Distance-based statistics need a metric plane, so every station and grid
//! coordinate goes through a [`CoordinateProjector`] before any distance is
//! computed.

pub mod projector;
pub mod utm;

pub use projector::CoordinateProjector;
pub use utm::UtmProjector;
