//! Geographic bounding box over which a prediction grid is built.

use serde::{Deserialize, Serialize};

use crate::error::{SurfaceError, SurfaceResult};

/// A geographic bounding box in WGS84 degrees.
///
/// Field order follows the `(lat_min, lat_max, lon_min, lon_max)` tuple used
/// by station feeds. Construct through [`BoundingBox::new`] so the extent is
/// validated once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> SurfaceResult<Self> {
        let bbox = Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a feed-style `"lat1,lon1,lat2,lon2"` corner string.
    ///
    /// The two corners may be given in either order.
    pub fn from_latlng_string(s: &str) -> SurfaceResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(SurfaceError::invalid_input(format!(
                "invalid bounding box '{}': expected 'lat1,lon1,lat2,lon2'",
                s
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                SurfaceError::invalid_input(format!("invalid number in bounding box: {}", part))
            })?;
        }

        let [lat1, lon1, lat2, lon2] = values;
        Self::new(lat1.min(lat2), lat1.max(lat2), lon1.min(lon2), lon1.max(lon2))
    }

    /// Check the extent is finite, ordered and inside the geographic domain.
    pub fn validate(&self) -> SurfaceResult<()> {
        let all = [self.lat_min, self.lat_max, self.lon_min, self.lon_max];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(SurfaceError::invalid_input(format!(
                "bounding box has non-finite bounds: {:?}",
                self
            )));
        }
        if self.lat_min >= self.lat_max || self.lon_min >= self.lon_max {
            return Err(SurfaceError::invalid_input(format!(
                "bounding box must satisfy lat_min < lat_max and lon_min < lon_max: {:?}",
                self
            )));
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(SurfaceError::invalid_input(format!(
                "latitude range [{}, {}] is outside [-90, 90]",
                self.lat_min, self.lat_max
            )));
        }
        if self.lon_min < -180.0 || self.lon_max > 180.0 {
            return Err(SurfaceError::invalid_input(format!(
                "longitude range [{}, {}] is outside [-180, 180]",
                self.lon_min, self.lon_max
            )));
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    /// Centre point as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lon_min + self.lon_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }

    /// Grow the box by `margin` degrees on every side, clamped to the domain.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            lat_min: (self.lat_min - margin).max(-90.0),
            lat_max: (self.lat_max + margin).min(90.0),
            lon_min: (self.lon_min - margin).max(-180.0),
            lon_max: (self.lon_max + margin).min(180.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlng_string() {
        let bbox = BoundingBox::from_latlng_string("28.404,76.840,28.883,77.349").unwrap();
        assert_eq!(bbox.lat_min, 28.404);
        assert_eq!(bbox.lat_max, 28.883);
        assert_eq!(bbox.lon_min, 76.840);
        assert_eq!(bbox.lon_max, 77.349);
    }

    #[test]
    fn test_center_and_extent() {
        let bbox = BoundingBox::new(28.40, 28.88, 76.84, 77.35).unwrap();
        let (lon, lat) = bbox.center();
        assert!((lon - 77.095).abs() < 1e-9);
        assert!((lat - 28.64).abs() < 1e-9);
        assert!((bbox.width() - 0.51).abs() < 1e-9);
        assert!((bbox.height() - 0.48).abs() < 1e-9);
    }
}
