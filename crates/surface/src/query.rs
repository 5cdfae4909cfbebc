//! Point queries against a masked prediction grid.
//!
//! Every valid (unmasked) site is loaded into an R-tree keyed on its
//! `[lon, lat]` in degrees. A query returns the value of the nearest valid
//! site and reports whether the query point itself lies outside the region.
//!
//! Nearest-neighbour distance is measured in raw degrees. The optional
//! fallback cutoff is checked with the haversine distance in meters.

use std::sync::Arc;

use aq_common::RegionBoundary;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::PredictionGrid;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

type SiteEntry = GeomWithData<[f64; 2], usize>;

/// Answer to a point query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Value of the nearest valid site, `None` when there is none.
    pub value: Option<f64>,
    /// The query point lies outside the region boundary.
    pub extrapolated: bool,
}

/// Nearest valid site found for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSite {
    pub index: usize,
    pub lon: f64,
    pub lat: f64,
    pub value: f64,
}

/// Spatial index over the valid sites of one grid.
#[derive(Debug, Clone)]
pub struct PointQueryIndex {
    tree: RTree<SiteEntry>,
    values: Vec<Option<f64>>,
}

impl PointQueryIndex {
    /// Index every site that carries a value.
    pub fn build(grid: &PredictionGrid) -> Self {
        let entries: Vec<SiteEntry> = grid
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(idx, _)| GeomWithData::new([grid.lons[idx], grid.lats[idx]], idx))
            .collect();

        debug!(sites = entries.len(), "Built point query index");

        Self {
            tree: RTree::bulk_load(entries),
            values: grid.values.clone(),
        }
    }

    /// Number of indexed sites.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest valid site to `(lon, lat)` by planar degree distance.
    pub fn nearest(&self, lon: f64, lat: f64) -> Option<NearestSite> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let entry = self.tree.nearest_neighbor(&[lon, lat])?;
        let [site_lon, site_lat] = *entry.geom();
        let value = self.values.get(entry.data).copied().flatten()?;
        Some(NearestSite {
            index: entry.data,
            lon: site_lon,
            lat: site_lat,
            value,
        })
    }
}

/// Answers point queries for one surface.
#[derive(Debug, Clone)]
pub struct PointQueryService {
    index: PointQueryIndex,
    boundary: Arc<RegionBoundary>,
    max_fallback_distance_m: Option<f64>,
}

impl PointQueryService {
    pub fn new(index: PointQueryIndex, boundary: Arc<RegionBoundary>) -> Self {
        Self {
            index,
            boundary,
            max_fallback_distance_m: None,
        }
    }

    /// Refuse values for outside-boundary queries whose nearest site is
    /// farther than `meters`. Queries inside the boundary are unaffected.
    pub fn with_max_fallback_distance(mut self, meters: Option<f64>) -> Self {
        self.max_fallback_distance_m = meters;
        self
    }

    pub fn index(&self) -> &PointQueryIndex {
        &self.index
    }

    pub fn boundary(&self) -> &RegionBoundary {
        &self.boundary
    }

    /// Look up the surface value at `(lon, lat)`.
    ///
    /// Never fails: an empty grid or a non-finite coordinate gives
    /// `value: None`.
    pub fn query(&self, lon: f64, lat: f64) -> QueryResult {
        let extrapolated = !self.boundary.contains(lon, lat);

        let value = self.index.nearest(lon, lat).and_then(|site| {
            match self.max_fallback_distance_m {
                Some(limit) if extrapolated && haversine_distance(lon, lat, site.lon, site.lat) > limit => {
                    debug!(
                        lon = lon,
                        lat = lat,
                        limit_m = limit,
                        "Nearest site beyond fallback cutoff"
                    );
                    None
                }
                _ => Some(site.value),
            }
        });

        QueryResult {
            value,
            extrapolated,
        }
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::GeoPoint;

    /// 3×3 grid around (77, 28.5) with the north-east corner masked.
    fn grid() -> PredictionGrid {
        let mut lons = Vec::new();
        let mut lats = Vec::new();
        let mut values = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                lons.push(77.0 + 0.1 * col as f64);
                lats.push(28.5 + 0.1 * row as f64);
                values.push(Some((row * 3 + col) as f64 * 10.0));
            }
        }
        values[8] = None;
        PredictionGrid {
            resolution: 3,
            variances: values.iter().map(|v| v.map(|_| 1.0)).collect(),
            lons,
            lats,
            values,
        }
    }

    fn boundary() -> Arc<RegionBoundary> {
        Arc::new(
            RegionBoundary::from_ring(&[
                GeoPoint::new(76.95, 28.45),
                GeoPoint::new(77.25, 28.45),
                GeoPoint::new(77.25, 28.75),
                GeoPoint::new(76.95, 28.75),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_index_skips_masked_sites() {
        let index = PointQueryIndex::build(&grid());
        assert_eq!(index.len(), 8);

        // Closest raw site is the masked corner; the answer comes from a neighbour
        let nearest = index.nearest(77.21, 28.71).unwrap();
        assert_ne!(nearest.index, 8);
        assert!(nearest.value == 50.0 || nearest.value == 70.0);
    }

    #[test]
    fn test_query_inside_is_not_extrapolated() {
        let service = PointQueryService::new(PointQueryIndex::build(&grid()), boundary());
        let result = service.query(77.09, 28.61);
        assert_eq!(result.value, Some(40.0));
        assert!(!result.extrapolated);
    }

    #[test]
    fn test_query_outside_is_extrapolated() {
        let service = PointQueryService::new(PointQueryIndex::build(&grid()), boundary());
        let result = service.query(76.0, 28.5);
        assert_eq!(result.value, Some(0.0));
        assert!(result.extrapolated);
    }

    #[test]
    fn test_fallback_cutoff() {
        let service = PointQueryService::new(PointQueryIndex::build(&grid()), boundary())
            .with_max_fallback_distance(Some(5_000.0));

        // About 97 km west of the nearest site
        let far = service.query(76.0, 28.5);
        assert_eq!(far.value, None);
        assert!(far.extrapolated);

        let near = service.query(77.01, 28.5);
        assert_eq!(near.value, Some(0.0));
    }

    #[test]
    fn test_cutoff_ignores_inside_queries() {
        let service = PointQueryService::new(PointQueryIndex::build(&grid()), boundary())
            .with_max_fallback_distance(Some(100.0));

        // Several kilometres from any site, but inside the boundary
        let inside = service.query(77.04, 28.53);
        assert_eq!(inside.value, Some(0.0));
        assert!(!inside.extrapolated);

        let outside = service.query(76.90, 28.5);
        assert_eq!(outside.value, None);
        assert!(outside.extrapolated);
    }

    #[test]
    fn test_empty_grid_returns_none() {
        let mut empty = grid();
        empty.values = vec![None; 9];
        let service = PointQueryService::new(PointQueryIndex::build(&empty), boundary());
        let result = service.query(77.1, 28.6);
        assert_eq!(result.value, None);
        assert!(!result.extrapolated);
    }

    #[test]
    fn test_non_finite_query() {
        let service = PointQueryService::new(PointQueryIndex::build(&grid()), boundary());
        let result = service.query(f64::NAN, 28.6);
        assert_eq!(result.value, None);
        assert!(result.extrapolated);
    }

    #[test]
    fn test_haversine_distance() {
        // London to Paris, roughly 344 km
        let d = haversine_distance(-0.1276, 51.5074, 2.3522, 48.8566);
        assert!((d - 343_500.0).abs() < 2_000.0, "got {}", d);
        assert_eq!(haversine_distance(77.0, 28.0, 77.0, 28.0), 0.0);
    }
}
