//! End-to-end surface generation.
//!
//! ```text
//! stations ──► project ──► variogram + kriging ──┐
//!                                                ├──► mask ──► index
//! bbox ──► lattice (planar, back-projected) ─────┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use aq_common::{
    BoundingBox, RegionBoundary, StationBatch, SurfaceError, SurfaceResult, MIN_STATIONS,
};
use projection::{CoordinateProjector, UtmProjector};
use tracing::{debug, info};

use crate::config::SurfaceConfig;
use crate::grid::GridBuilder;
use crate::kriging::SpatialInterpolator;
use crate::mask::apply_mask;
use crate::query::{PointQueryIndex, PointQueryService, QueryResult};
use crate::types::{GridExport, PredictionGrid};

/// Everything that determines a surface.
#[derive(Debug, Clone)]
pub struct SurfaceRequest {
    pub stations: Arc<StationBatch>,
    pub bbox: BoundingBox,
    pub boundary: Arc<RegionBoundary>,
    pub resolution: usize,
}

impl SurfaceRequest {
    pub fn new(
        stations: StationBatch,
        bbox: BoundingBox,
        boundary: RegionBoundary,
        resolution: usize,
    ) -> Self {
        Self {
            stations: Arc::new(stations),
            bbox,
            boundary: Arc::new(boundary),
            resolution,
        }
    }
}

/// A computed surface: the masked grid plus its point-query index.
#[derive(Debug, Clone)]
pub struct Surface {
    grid: PredictionGrid,
    queries: PointQueryService,
    crs: String,
    strategy: String,
    description: String,
}

impl Surface {
    pub fn grid(&self) -> &PredictionGrid {
        &self.grid
    }

    /// Value at `(lon, lat)` from the nearest valid site.
    pub fn query(&self, lon: f64, lat: f64) -> QueryResult {
        self.queries.query(lon, lat)
    }

    /// Planar CRS the surface was interpolated in.
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// Name of the interpolation strategy that succeeded.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Fitted parameters of that strategy.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn query_index(&self) -> &PointQueryIndex {
        self.queries.index()
    }

    pub fn to_export(&self) -> GridExport {
        self.grid.to_export(&self.crs, &self.strategy)
    }
}

/// Runs the surface pipeline with one configuration.
#[derive(Debug)]
pub struct SurfaceEngine {
    config: SurfaceConfig,
    interpolator: SpatialInterpolator,
    projector: Option<Arc<dyn CoordinateProjector>>,
}

impl SurfaceEngine {
    /// Create an engine. A configured UTM zone pins the projection;
    /// otherwise each request picks the zone of its bounding box center.
    pub fn new(config: SurfaceConfig) -> SurfaceResult<Self> {
        config.validate()?;

        let projector = match config.utm_zone {
            Some(zone) => Some(Arc::new(UtmProjector::new(zone, config.southern_hemisphere)?)
                as Arc<dyn CoordinateProjector>),
            None => None,
        };

        Ok(Self {
            interpolator: SpatialInterpolator::from_config(&config),
            config,
            projector,
        })
    }

    /// Use `projector` for every request instead of a UTM zone.
    pub fn with_projector(mut self, projector: Arc<dyn CoordinateProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Build a request at the configured resolution.
    pub fn request(
        &self,
        stations: StationBatch,
        bbox: BoundingBox,
        boundary: RegionBoundary,
    ) -> SurfaceRequest {
        SurfaceRequest::new(stations, bbox, boundary, self.config.resolution)
    }

    fn projector_for(&self, bbox: &BoundingBox) -> SurfaceResult<Arc<dyn CoordinateProjector>> {
        match &self.projector {
            Some(p) => Ok(Arc::clone(p)),
            None => Ok(Arc::new(UtmProjector::for_region(bbox)?)),
        }
    }

    /// Compute the surface for `request`.
    ///
    /// CPU-bound; call from a blocking context when running under async.
    pub fn run(&self, request: &SurfaceRequest) -> SurfaceResult<Surface> {
        let start = Instant::now();

        if request.resolution < 2 {
            return Err(SurfaceError::InvalidResolution(request.resolution));
        }
        request.bbox.validate()?;

        let readings = request.stations.readings();
        if readings.len() < MIN_STATIONS {
            return Err(SurfaceError::insufficient(format!(
                "{} stations, at least {} required",
                readings.len(),
                MIN_STATIONS
            )));
        }

        let projector = self.projector_for(&request.bbox)?;

        let positions: Vec<(f64, f64)> = readings
            .iter()
            .map(|r| (r.longitude, r.latitude))
            .collect();
        let points = projector.to_planar_many(&positions)?;
        let values = request.stations.values();
        let (min_value, max_value) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        debug!(
            stations = values.len(),
            min_value,
            max_value,
            crs = %projector.crs_name(),
            "Projected stations"
        );

        let lattice = GridBuilder::new(projector.as_ref()).build(&request.bbox, request.resolution)?;
        let sites: Vec<(f64, f64)> = lattice
            .xs()
            .iter()
            .copied()
            .zip(lattice.ys().iter().copied())
            .collect();

        let output = self.interpolator.interpolate(&points, &values, &sites)?;
        debug!(
            strategy = %output.strategy,
            params = %output.description,
            "Interpolated lattice"
        );

        let grid = apply_mask(&lattice, &output.predictions, &request.boundary)?;

        let queries = PointQueryService::new(
            PointQueryIndex::build(&grid),
            Arc::clone(&request.boundary),
        )
        .with_max_fallback_distance(self.config.max_fallback_distance_m);

        info!(
            stations = readings.len(),
            resolution = request.resolution,
            valid_sites = grid.valid_count(),
            crs = %projector.crs_name(),
            strategy = %output.strategy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Surface computed"
        );

        Ok(Surface {
            grid,
            queries,
            crs: projector.crs_name(),
            strategy: output.strategy,
            description: output.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::{GeoPoint, StationReading};

    fn stations() -> StationBatch {
        StationBatch::from_readings(vec![
            StationReading::new(74.85, 28.10, 60.0),
            StationReading::new(75.15, 28.12, 140.0),
            StationReading::new(75.00, 28.40, 220.0),
            StationReading::new(74.90, 28.30, 110.0),
        ])
        .unwrap()
    }

    fn region() -> (BoundingBox, RegionBoundary) {
        let bbox = BoundingBox::new(28.0, 28.5, 74.75, 75.25).unwrap();
        let boundary = RegionBoundary::from_ring(&[
            GeoPoint::new(74.80, 28.05),
            GeoPoint::new(75.20, 28.05),
            GeoPoint::new(75.20, 28.45),
            GeoPoint::new(74.80, 28.45),
        ])
        .unwrap();
        (bbox, boundary)
    }

    fn engine(resolution: usize) -> SurfaceEngine {
        SurfaceEngine::new(SurfaceConfig {
            resolution,
            ..SurfaceConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_run_produces_square_grid() {
        let (bbox, boundary) = region();
        let engine = engine(30);
        let surface = engine.run(&engine.request(stations(), bbox, boundary)).unwrap();

        assert_eq!(surface.grid().resolution, 30);
        assert_eq!(surface.grid().len(), 900);
        assert_eq!(surface.crs(), "EPSG:32643");
        assert_eq!(surface.strategy(), "linear");
        assert!(surface.grid().valid_count() > 0);
        assert_eq!(surface.query_index().len(), surface.grid().valid_count());
    }

    #[test]
    fn test_fixed_zone_is_used() {
        let (bbox, boundary) = region();
        let engine = SurfaceEngine::new(SurfaceConfig {
            resolution: 8,
            utm_zone: Some(42),
            ..SurfaceConfig::default()
        })
        .unwrap();
        let surface = engine.run(&engine.request(stations(), bbox, boundary)).unwrap();
        assert_eq!(surface.crs(), "EPSG:32642");
    }

    #[test]
    fn test_invalid_resolution() {
        let (bbox, boundary) = region();
        let engine = engine(10);
        let request = SurfaceRequest::new(stations(), bbox, boundary, 1);
        assert!(matches!(
            engine.run(&request),
            Err(SurfaceError::InvalidResolution(1))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = SurfaceEngine::new(SurfaceConfig {
            resolution: 0,
            ..SurfaceConfig::default()
        });
        assert!(result.is_err());
    }
}
