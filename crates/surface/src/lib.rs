//! Continuous air-quality surfaces from sparse monitoring stations.
//!
//! Station readings are projected into a metric UTM plane, a variogram is
//! fitted and ordinary kriging predicts a regular lattice over the region's
//! bounding box. Sites outside the region boundary are masked and the rest
//! are indexed for nearest-site point queries.
//!
//! # Architecture
//!
//! ```text
//! StationBatch + BoundingBox + RegionBoundary + resolution
//!      │
//!      ▼
//! SurfaceCache::get_or_compute(request)
//!      │
//!      ├─► Cache hit: return shared Arc<Surface>
//!      │
//!      └─► Cache miss: SurfaceEngine::run on the blocking pool
//!               │
//!               ├─► UtmProjector::for_region(bbox)
//!               ├─► GridBuilder::build (n × n planar lattice)
//!               ├─► SpatialInterpolator (linear, then spherical)
//!               ├─► apply_mask (strict point-in-polygon)
//!               └─► PointQueryIndex (R-tree over valid sites)
//!                        │
//!                        ▼
//!                   Surface::query(lon, lat) → QueryResult
//! ```
//!
//! # Example
//!
//! ```ignore
//! use surface::{SurfaceConfig, SurfaceEngine};
//!
//! let engine = SurfaceEngine::new(SurfaceConfig::from_env())?;
//! let surface = engine.run(&engine.request(stations, bbox, boundary))?;
//!
//! let result = surface.query(77.21, 28.61);
//! println!("{:?} (extrapolated: {})", result.value, result.extrapolated);
//! ```

pub mod cache;
pub mod config;
pub mod grid;
pub mod kriging;
pub mod mask;
pub mod pipeline;
pub mod query;
pub mod types;
pub mod variogram;

// Re-export commonly used types at crate root
pub use cache::{SurfaceCache, SurfaceKey};
pub use config::SurfaceConfig;
pub use grid::{GridBuilder, PredictionLattice};
pub use kriging::{
    InterpolationOutput, InterpolationStrategy, OrdinaryKriging, Prediction, SpatialInterpolator,
    VariogramStrategy,
};
pub use mask::apply_mask;
pub use pipeline::{Surface, SurfaceEngine, SurfaceRequest};
pub use query::{PointQueryIndex, PointQueryService, QueryResult};
pub use types::{CacheStats, GridExport, GridSite, PredictionGrid};
pub use variogram::{ExperimentalVariogram, VariogramModel, VariogramParams};
