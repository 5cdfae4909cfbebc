//! Station readings and the validated batch fed into an interpolation run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{SurfaceError, SurfaceResult};

/// Minimum number of distinct, non-collinear stations needed to fit a variogram.
pub const MIN_STATIONS: usize = 3;

/// A geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "lon")]
    pub longitude: f64,
    #[serde(alias = "lat")]
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Fail with a ProjectionError when the point is outside the geographic domain.
    pub fn validate(&self) -> SurfaceResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SurfaceError::projection(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SurfaceError::projection(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// One sensor observation: where it was taken and the pollutant index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    #[serde(alias = "lon")]
    pub longitude: f64,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "aqi")]
    pub value: f64,
}

impl StationReading {
    pub fn new(longitude: f64, latitude: f64, value: f64) -> Self {
        Self {
            longitude,
            latitude,
            value,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

/// Feed row as published by monitoring services.
///
/// The index arrives as a number, a numeric string, or `"-"` when the
/// station is offline, so it is kept loose until cleaning.
#[derive(Debug, Deserialize)]
struct RawStationRow {
    #[serde(alias = "lon")]
    longitude: Value,
    #[serde(alias = "lat")]
    latitude: Value,
    #[serde(alias = "aqi")]
    value: Value,
}

fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A cleaned, validated batch of station readings.
///
/// Holding a `StationBatch` guarantees at least [`MIN_STATIONS`] distinct,
/// non-collinear positions, each inside the geographic domain, with finite
/// non-negative values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationBatch {
    readings: Vec<StationReading>,
}

impl StationBatch {
    /// Clean and validate a set of readings.
    ///
    /// Readings with a non-finite or negative value are dropped. Readings
    /// that share an exact position are merged into one with the mean value.
    pub fn from_readings(readings: Vec<StationReading>) -> SurfaceResult<Self> {
        let supplied = readings.len();
        let mut merged: Vec<(StationReading, usize)> = Vec::with_capacity(supplied);
        let mut by_position: HashMap<(u64, u64), usize> = HashMap::new();

        for reading in readings {
            if !reading.value.is_finite() || reading.value < 0.0 {
                warn!(
                    lon = reading.longitude,
                    lat = reading.latitude,
                    value = reading.value,
                    "Dropping station reading with unusable value"
                );
                continue;
            }
            reading.position().validate()?;

            let key = (reading.longitude.to_bits(), reading.latitude.to_bits());
            match by_position.get(&key) {
                Some(&idx) => {
                    let (acc, count) = &mut merged[idx];
                    acc.value += reading.value;
                    *count += 1;
                }
                None => {
                    by_position.insert(key, merged.len());
                    merged.push((reading, 1));
                }
            }
        }

        let readings: Vec<StationReading> = merged
            .into_iter()
            .map(|(mut reading, count)| {
                reading.value /= count as f64;
                reading
            })
            .collect();

        if readings.len() < MIN_STATIONS {
            return Err(SurfaceError::insufficient(format!(
                "{} usable station positions (from {} readings), at least {} required",
                readings.len(),
                supplied,
                MIN_STATIONS
            )));
        }
        if all_collinear(&readings) {
            return Err(SurfaceError::insufficient(format!(
                "all {} station positions are collinear",
                readings.len()
            )));
        }

        debug!(
            supplied = supplied,
            usable = readings.len(),
            "Station batch validated"
        );

        Ok(Self { readings })
    }

    /// Parse feed rows and validate the result.
    ///
    /// Accepts a bare JSON array of rows or a feed envelope carrying the
    /// rows under `"data"`. Rows whose coordinates or value cannot be read
    /// as numbers are skipped.
    pub fn from_json_str(json: &str) -> SurfaceResult<Self> {
        let document: Value = serde_json::from_str(json)?;
        let rows_value = match document {
            Value::Object(mut envelope) => envelope.remove("data").ok_or_else(|| {
                SurfaceError::invalid_input("station feed object has no \"data\" array")
            })?,
            other => other,
        };
        let rows: Vec<RawStationRow> = serde_json::from_value(rows_value)?;
        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            match (
                loose_number(&row.longitude),
                loose_number(&row.latitude),
                loose_number(&row.value),
            ) {
                (Some(lon), Some(lat), Some(value)) => {
                    readings.push(StationReading::new(lon, lat, value))
                }
                _ => debug!(?row, "Skipping station row without numeric fields"),
            }
        }
        Self::from_readings(readings)
    }

    pub fn readings(&self) -> &[StationReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Always false for a validated batch; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }

    /// Smallest and largest station value.
    pub fn value_range(&self) -> (f64, f64) {
        self.readings
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.value), hi.max(r.value))
            })
    }
}

fn all_collinear(readings: &[StationReading]) -> bool {
    let origin = readings[0].position();
    let far = readings
        .iter()
        .skip(1)
        .map(|r| r.position())
        .max_by(|a, b| {
            dist2(origin, *a)
                .partial_cmp(&dist2(origin, *b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    let Some(far) = far else {
        return true;
    };

    let dx = far.longitude - origin.longitude;
    let dy = far.latitude - origin.latitude;
    let scale = dx * dx + dy * dy;
    readings.iter().skip(1).all(|r| {
        let cross = dx * (r.latitude - origin.latitude) - dy * (r.longitude - origin.longitude);
        cross.abs() <= 1e-12 * scale
    })
}

fn dist2(a: GeoPoint, b: GeoPoint) -> f64 {
    let dx = a.longitude - b.longitude;
    let dy = a.latitude - b.latitude;
    dx * dx + dy * dy
}
