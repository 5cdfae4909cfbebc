//! The projector seam shared by the grid builder and the interpolator.

use aq_common::SurfaceResult;

/// Bidirectional conversion between WGS84 degrees and a metric plane.
///
/// Implementations are immutable service objects: construct one per target
/// region and share it by reference. Both directions fail with a
/// `ProjectionError` for input outside their valid domain.
pub trait CoordinateProjector: Send + Sync + std::fmt::Debug {
    /// Geographic `(lon, lat)` in degrees to planar `(x, y)` in meters.
    fn to_planar(&self, lon: f64, lat: f64) -> SurfaceResult<(f64, f64)>;

    /// Planar `(x, y)` in meters to geographic `(lon, lat)` in degrees.
    fn to_geographic(&self, x: f64, y: f64) -> SurfaceResult<(f64, f64)>;

    /// Identifier of the planar CRS, e.g. `EPSG:32643`.
    fn crs_name(&self) -> String;

    /// Project many points, failing on the first out-of-domain input.
    fn to_planar_many(&self, points: &[(f64, f64)]) -> SurfaceResult<Vec<(f64, f64)>> {
        points
            .iter()
            .map(|&(lon, lat)| self.to_planar(lon, lat))
            .collect()
    }

    /// Unproject many points, failing on the first out-of-domain input.
    fn to_geographic_many(&self, points: &[(f64, f64)]) -> SurfaceResult<Vec<(f64, f64)>> {
        points
            .iter()
            .map(|&(x, y)| self.to_geographic(x, y))
            .collect()
    }
}
