//! Universal Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! Uses the Krüger n-series (third order), which is accurate to well under
//! a millimetre inside a zone and stays well behaved several zones out.
//!
//! The projection parameters include:
//! - Zone (1-60): fixes the central meridian at `6 * zone - 183` degrees
//! - Hemisphere: southern zones add a 10,000 km false northing
//! - Scale factor k0 = 0.9996 and false easting 500 km

use std::f64::consts::PI;

use aq_common::{BoundingBox, GeoPoint, SurfaceError, SurfaceResult};
use tracing::debug;

use crate::projector::CoordinateProjector;

/// WGS84 semi-major axis (meters).
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Central scale factor.
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM projection for a single zone.
#[derive(Debug, Clone)]
pub struct UtmProjector {
    /// Zone number 1-60
    zone: u8,
    /// Southern hemisphere variant (EPSG:327xx)
    south: bool,
    /// Central meridian in radians
    lon0: f64,
    /// Rectifying radius scaled by k0
    k0_a: f64,
    /// Forward series coefficients
    alpha: [f64; 3],
    /// Inverse series coefficients
    beta: [f64; 3],
    /// Conformal-to-geodetic latitude coefficients
    delta: [f64; 3],
    /// 2√n / (1 + n)
    ecc_term: f64,
}

impl UtmProjector {
    /// Create a projector for an explicit zone.
    pub fn new(zone: u8, south: bool) -> SurfaceResult<Self> {
        if !(1..=60).contains(&zone) {
            return Err(SurfaceError::projection(format!(
                "UTM zone {} is outside 1-60",
                zone
            )));
        }

        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;
        let a = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);

        Ok(Self {
            zone,
            south,
            lon0: (zone as f64 * 6.0 - 183.0).to_radians(),
            k0_a: K0 * a,
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
            ecc_term: 2.0 * n.sqrt() / (1.0 + n),
        })
    }

    /// Zone containing a longitude, ignoring the Norway/Svalbard exceptions.
    pub fn zone_for_longitude(lon: f64) -> u8 {
        (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8
    }

    /// Pick the zone and hemisphere from the centre of a bounding box.
    ///
    /// Delhi's box, for example, lands in zone 43N (EPSG:32643).
    pub fn for_region(bbox: &BoundingBox) -> SurfaceResult<Self> {
        let (lon, lat) = bbox.center();
        let zone = Self::zone_for_longitude(lon);
        let projector = Self::new(zone, lat < 0.0)?;
        debug!(crs = %projector.crs_name(), "Selected UTM zone for region");
        Ok(projector)
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn is_south(&self) -> bool {
        self.south
    }

    /// EPSG code of this zone (326xx north, 327xx south).
    pub fn epsg(&self) -> u32 {
        if self.south {
            32700 + self.zone as u32
        } else {
            32600 + self.zone as u32
        }
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    fn false_northing(&self) -> f64 {
        if self.south {
            FALSE_NORTHING_SOUTH
        } else {
            0.0
        }
    }
}

/// Wrap an angle in radians into [-π, π].
fn normalize_angle(mut a: f64) -> f64 {
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

impl CoordinateProjector for UtmProjector {
    fn to_planar(&self, lon: f64, lat: f64) -> SurfaceResult<(f64, f64)> {
        GeoPoint::new(lon, lat).validate()?;

        let phi = lat.to_radians();
        let dlon = normalize_angle(lon.to_radians() - self.lon0);

        // Conformal latitude; at the poles atanh(1) is infinite and t follows.
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - self.ecc_term * (self.ecc_term * sin_phi).atanh()).sinh();

        let xi_p = t.atan2(dlon.cos());
        let eta_p = if t.is_infinite() {
            0.0
        } else {
            (dlon.sin() / (1.0 + t * t).sqrt()).atanh()
        };

        let mut easting = eta_p;
        let mut northing = xi_p;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            easting += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
            northing += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        }

        let x = FALSE_EASTING + self.k0_a * easting;
        let y = self.false_northing() + self.k0_a * northing;

        if !x.is_finite() || !y.is_finite() {
            return Err(SurfaceError::projection(format!(
                "({}, {}) cannot be represented in {}",
                lon,
                lat,
                self.crs_name()
            )));
        }
        Ok((x, y))
    }

    fn to_geographic(&self, x: f64, y: f64) -> SurfaceResult<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SurfaceError::projection(format!(
                "planar coordinate ({}, {}) is not finite",
                x, y
            )));
        }

        let xi = (y - self.false_northing()) / self.k0_a;
        let eta = (x - FALSE_EASTING) / self.k0_a;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).clamp(-1.0, 1.0).asin();
        let mut phi = chi;
        for (j, delta) in self.delta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            phi += delta * (k * chi).sin();
        }
        let lambda = normalize_angle(self.lon0 + eta_p.sinh().atan2(xi_p.cos()));

        let (lon, lat) = (lambda.to_degrees(), phi.to_degrees().clamp(-90.0, 90.0));
        if !lon.is_finite() || !lat.is_finite() {
            return Err(SurfaceError::projection(format!(
                "planar coordinate ({}, {}) is outside {}",
                x,
                y,
                self.crs_name()
            )));
        }
        Ok((lon, lat))
    }

    fn crs_name(&self) -> String {
        format!("EPSG:{}", self.epsg())
    }
}
