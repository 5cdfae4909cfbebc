//! Cache implementations for computed surfaces.

mod surface_cache;

pub use surface_cache::{SurfaceCache, SurfaceKey};
