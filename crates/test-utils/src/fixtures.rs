//! Common test fixtures for surface engine tests.
//!
//! This module provides pre-defined inputs that represent common
//! scenarios in air-quality interpolation.

use aq_common::{BoundingBox, GeoPoint, RegionBoundary, StationReading};

/// Delhi NCT extent as `(lat_min, lat_max, lon_min, lon_max)`.
pub const DELHI_BOUNDS: (f64, f64, f64, f64) = (28.40, 28.88, 76.84, 77.35);

/// A box straddling the zone 43N central meridian, where UTM distortion is smallest.
pub const MERIDIAN_BOUNDS: (f64, f64, f64, f64) = (28.0, 28.5, 74.75, 75.25);

pub fn delhi_bbox() -> BoundingBox {
    let (lat_min, lat_max, lon_min, lon_max) = DELHI_BOUNDS;
    BoundingBox::new(lat_min, lat_max, lon_min, lon_max).expect("fixture bbox is valid")
}

pub fn meridian_bbox() -> BoundingBox {
    let (lat_min, lat_max, lon_min, lon_max) = MERIDIAN_BOUNDS;
    BoundingBox::new(lat_min, lat_max, lon_min, lon_max).expect("fixture bbox is valid")
}

/// Counter-clockwise square ring (not explicitly closed).
pub fn square_ring(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(lon_min, lat_min),
        GeoPoint::new(lon_max, lat_min),
        GeoPoint::new(lon_max, lat_max),
        GeoPoint::new(lon_min, lat_max),
    ]
}

pub fn square_boundary(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> RegionBoundary {
    RegionBoundary::from_ring(&square_ring(lon_min, lat_min, lon_max, lat_max))
        .expect("fixture square is valid")
}

/// A rough outline of Delhi, inset from [`DELHI_BOUNDS`].
pub fn delhi_outline() -> RegionBoundary {
    let ring: Vec<GeoPoint> = [
        (76.95, 28.42),
        (77.22, 28.41),
        (77.34, 28.55),
        (77.33, 28.72),
        (77.18, 28.87),
        (76.98, 28.84),
        (76.85, 28.62),
    ]
    .iter()
    .map(|&(lon, lat)| GeoPoint::new(lon, lat))
    .collect();
    RegionBoundary::from_ring(&ring).expect("fixture outline is valid")
}

/// Three stations with values 50, 150 and 250, well inside Delhi.
pub fn three_station_readings() -> Vec<StationReading> {
    vec![
        StationReading::new(77.00, 28.55, 50.0),
        StationReading::new(77.20, 28.52, 150.0),
        StationReading::new(77.10, 28.75, 250.0),
    ]
}

/// A dozen stations resembling a live Delhi feed.
pub fn delhi_readings() -> Vec<StationReading> {
    vec![
        StationReading::new(77.2273, 28.6353, 182.0),
        StationReading::new(77.1025, 28.7041, 215.0),
        StationReading::new(77.3150, 28.6700, 240.0),
        StationReading::new(77.0688, 28.5706, 160.0),
        StationReading::new(77.2090, 28.5355, 138.0),
        StationReading::new(76.9965, 28.6692, 198.0),
        StationReading::new(77.1500, 28.8000, 255.0),
        StationReading::new(77.2750, 28.5500, 171.0),
        StationReading::new(77.0300, 28.4900, 122.0),
        StationReading::new(77.1800, 28.6200, 176.0),
        StationReading::new(77.2500, 28.7400, 230.0),
        StationReading::new(76.9200, 28.7500, 205.0),
    ]
}
