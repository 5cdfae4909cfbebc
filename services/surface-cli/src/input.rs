//! Loading station feeds, boundaries and query points.

use std::path::Path;

use anyhow::{Context, Result};
use aq_common::{BoundingBox, RegionBoundary, StationBatch};
use tracing::info;

/// Read a station feed (JSON rows or a `{"data": [...]}` envelope).
pub fn load_stations(path: &Path) -> Result<StationBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stations file: {}", path.display()))?;

    let batch = StationBatch::from_json_str(&content)
        .with_context(|| format!("Failed to load stations from {}", path.display()))?;

    let (min, max) = batch.value_range();
    info!(
        path = %path.display(),
        stations = batch.len(),
        min_value = min,
        max_value = max,
        "Loaded stations"
    );
    Ok(batch)
}

/// Read a region boundary from GeoJSON.
pub fn load_boundary(path: &Path) -> Result<RegionBoundary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read boundary file: {}", path.display()))?;

    let boundary = RegionBoundary::from_geojson_str(&content)
        .with_context(|| format!("Failed to load boundary from {}", path.display()))?;

    info!(path = %path.display(), parts = boundary.part_count(), "Loaded boundary");
    Ok(boundary)
}

/// Use the `"lat1,lon1,lat2,lon2"` box when given, else the boundary extent.
pub fn resolve_bbox(arg: Option<&str>, boundary: &RegionBoundary) -> Result<BoundingBox> {
    match arg {
        Some(s) => BoundingBox::from_latlng_string(s).context("Invalid --bbox"),
        None => Ok(boundary.bounds()),
    }
}

/// Parse a `lon,lat` query point.
pub fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (lon, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'lon,lat', got '{}'", s))?;

    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;

    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("point ({}, {}) is outside the geographic domain", lon, lat));
    }
    Ok((lon, lat))
}
