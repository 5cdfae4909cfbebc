//! Deterministic generators for synthetic station data.
//!
//! These generators create predictable, verifiable inputs that can be used
//! across the test suite without pulling in a random number generator.

use aq_common::{BoundingBox, StationReading};

/// Spread `count` stations over `bbox` using a 2D Halton sequence.
///
/// Positions are well separated and never collinear for `count >= 3`.
/// Values follow a smooth west-to-east gradient with a bump in the middle,
/// ranging roughly from 40 to 300.
///
/// # Example
///
/// ```
/// use aq_common::BoundingBox;
/// use test_utils::halton_readings;
///
/// let bbox = BoundingBox::new(28.4, 28.9, 76.8, 77.4).unwrap();
/// let readings = halton_readings(8, &bbox);
/// assert_eq!(readings.len(), 8);
/// assert!(readings.iter().all(|r| bbox.contains(r.longitude, r.latitude)));
/// ```
pub fn halton_readings(count: usize, bbox: &BoundingBox) -> Vec<StationReading> {
    (1..=count)
        .map(|i| {
            let u = halton(i, 2);
            let v = halton(i, 3);
            let lon = bbox.lon_min + u * bbox.width();
            let lat = bbox.lat_min + v * bbox.height();
            StationReading::new(lon, lat, smooth_field(u, v))
        })
        .collect()
}

/// Synthetic pollutant field over the unit square.
pub fn smooth_field(u: f64, v: f64) -> f64 {
    let bump = (-((u - 0.5).powi(2) + (v - 0.5).powi(2)) / 0.05).exp();
    40.0 + 160.0 * u + 100.0 * bump
}

/// Radical inverse of `index` in `base`.
pub fn halton(mut index: usize, base: usize) -> f64 {
    let mut result = 0.0;
    let mut f = 1.0 / base as f64;
    while index > 0 {
        result += f * (index % base) as f64;
        index /= base;
        f /= base as f64;
    }
    result
}

/// Brute-force nearest valid site, returning `(index, squared degree distance)`.
///
/// Distances are measured in raw degrees to match the point-query index.
/// Returns `None` when every value is undefined.
pub fn brute_force_nearest(
    lons: &[f64],
    lats: &[f64],
    values: &[Option<f64>],
    lon: f64,
    lat: f64,
) -> Option<(usize, f64)> {
    lons.iter()
        .zip(lats)
        .zip(values)
        .enumerate()
        .filter(|(_, (_, value))| value.is_some())
        .map(|(idx, ((&site_lon, &site_lat), _))| {
            let d2 = (site_lon - lon).powi(2) + (site_lat - lat).powi(2);
            (idx, d2)
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
