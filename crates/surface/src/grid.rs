//! Regular prediction lattice in planar coordinates.
//!
//! The bounding box corners are projected, the planar rectangle they span is
//! sampled with `n` evenly spaced coordinates per axis (endpoints included),
//! and every site is projected back to lon/lat.
//!
//! Sites are stored row-major: `index = row * n + col`. Rows follow planar
//! northing ascending and columns follow easting ascending.

use aq_common::{BoundingBox, SurfaceError, SurfaceResult};
use projection::CoordinateProjector;
use tracing::debug;

/// The `n × n` set of prediction sites for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionLattice {
    resolution: usize,
    xs: Vec<f64>,
    ys: Vec<f64>,
    lons: Vec<f64>,
    lats: Vec<f64>,
}

impl PredictionLattice {
    /// Sites per axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Total number of sites (`n²`).
    pub fn len(&self) -> usize {
        self.lons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    /// Flat index of `(row, col)`.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.resolution + col
    }

    /// Planar eastings per site.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Planar northings per site.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Longitudes per site.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Latitudes per site.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// `(lon, lat)` of one site.
    pub fn geographic(&self, index: usize) -> (f64, f64) {
        (self.lons[index], self.lats[index])
    }

    /// `(x, y)` of one site.
    pub fn planar(&self, index: usize) -> (f64, f64) {
        (self.xs[index], self.ys[index])
    }
}

/// Builds prediction lattices through a coordinate projector.
#[derive(Debug, Clone, Copy)]
pub struct GridBuilder<'a> {
    projector: &'a dyn CoordinateProjector,
}

impl<'a> GridBuilder<'a> {
    pub fn new(projector: &'a dyn CoordinateProjector) -> Self {
        Self { projector }
    }

    /// Build an `n × n` lattice covering `bbox`.
    ///
    /// Fails with `InvalidResolution` for `n < 2` and propagates any
    /// projection failure.
    pub fn build(&self, bbox: &BoundingBox, resolution: usize) -> SurfaceResult<PredictionLattice> {
        if resolution < 2 {
            return Err(SurfaceError::InvalidResolution(resolution));
        }
        bbox.validate()?;

        let (x_sw, y_sw) = self.projector.to_planar(bbox.lon_min, bbox.lat_min)?;
        let (x_ne, y_ne) = self.projector.to_planar(bbox.lon_max, bbox.lat_max)?;

        let x_axis = linspace(x_sw, x_ne, resolution);
        let y_axis = linspace(y_sw, y_ne, resolution);

        let total = resolution * resolution;
        let mut xs = Vec::with_capacity(total);
        let mut ys = Vec::with_capacity(total);
        let mut lons = Vec::with_capacity(total);
        let mut lats = Vec::with_capacity(total);

        for &y in &y_axis {
            for &x in &x_axis {
                let (lon, lat) = self.projector.to_geographic(x, y)?;
                xs.push(x);
                ys.push(y);
                lons.push(lon);
                lats.push(lat);
            }
        }

        debug!(
            resolution = resolution,
            crs = %self.projector.crs_name(),
            x_span_m = x_ne - x_sw,
            y_span_m = y_ne - y_sw,
            "Built prediction lattice"
        );

        Ok(PredictionLattice {
            resolution,
            xs,
            ys,
            lons,
            lats,
        })
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::UtmProjector;

    fn delhi_bbox() -> BoundingBox {
        BoundingBox::new(28.40, 28.88, 76.84, 77.35).unwrap()
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(10.0, 20.0, 5);
        assert_eq!(v, vec![10.0, 12.5, 15.0, 17.5, 20.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_lattice_shape() {
        let projector = UtmProjector::for_region(&delhi_bbox()).unwrap();
        let lattice = GridBuilder::new(&projector).build(&delhi_bbox(), 50).unwrap();

        assert_eq!(lattice.resolution(), 50);
        assert_eq!(lattice.len(), 2500);
        assert_eq!(lattice.lons().len(), 2500);
        assert_eq!(lattice.xs().len(), 2500);
    }

    #[test]
    fn test_row_major_order() {
        let projector = UtmProjector::for_region(&delhi_bbox()).unwrap();
        let lattice = GridBuilder::new(&projector).build(&delhi_bbox(), 10).unwrap();

        // Along a row x grows and y is constant
        let (x0, y0) = lattice.planar(lattice.index(3, 0));
        let (x1, y1) = lattice.planar(lattice.index(3, 1));
        assert!(x1 > x0);
        assert_eq!(y0, y1);

        // Down a column y grows and x is constant
        let (x2, y2) = lattice.planar(lattice.index(4, 0));
        assert_eq!(x0, x2);
        assert!(y2 > y0);
    }

    #[test]
    fn test_corner_sites_hit_bbox_corners() {
        let bbox = delhi_bbox();
        let projector = UtmProjector::for_region(&bbox).unwrap();
        let lattice = GridBuilder::new(&projector).build(&bbox, 20).unwrap();

        let (lon, lat) = lattice.geographic(0);
        assert!((lon - bbox.lon_min).abs() < 1e-7);
        assert!((lat - bbox.lat_min).abs() < 1e-7);

        let (lon, lat) = lattice.geographic(lattice.len() - 1);
        assert!((lon - bbox.lon_max).abs() < 1e-7);
        assert!((lat - bbox.lat_max).abs() < 1e-7);
    }

    #[test]
    fn test_invalid_resolution() {
        let projector = UtmProjector::for_region(&delhi_bbox()).unwrap();
        let builder = GridBuilder::new(&projector);

        assert!(matches!(
            builder.build(&delhi_bbox(), 0),
            Err(SurfaceError::InvalidResolution(0))
        ));
        assert!(matches!(
            builder.build(&delhi_bbox(), 1),
            Err(SurfaceError::InvalidResolution(1))
        ));
    }
}
