//! Configuration for surface generation.

use aq_common::{SurfaceError, SurfaceResult};
use serde::{Deserialize, Serialize};

use crate::variogram::VariogramModel;

/// Configuration for the surface engine and its cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Lattice sites per axis (the grid is `resolution × resolution`).
    pub resolution: usize,

    /// Lower clamp applied to every prediction.
    pub value_floor: f64,

    /// Upper clamp applied to every prediction.
    pub value_ceiling: f64,

    /// Variogram models tried in order until one yields a stable system.
    pub variogram_models: Vec<VariogramModel>,

    /// Number of distance bins in the experimental variogram.
    pub variogram_lags: usize,

    /// Fixed UTM zone. When unset the zone is derived from the region center.
    pub utm_zone: Option<u8>,

    /// Use the southern-hemisphere false northing with a fixed zone.
    pub southern_hemisphere: bool,

    /// Point queries farther than this from every valid site return no value.
    pub max_fallback_distance_m: Option<f64>,

    /// Lifetime of a cached surface in seconds.
    pub cache_ttl_secs: u64,

    /// Number of surfaces kept by the cache.
    pub cache_capacity: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            resolution: 200,
            value_floor: 0.0,
            value_ceiling: 999.0,
            variogram_models: vec![VariogramModel::Linear, VariogramModel::Spherical],
            variogram_lags: 6,
            utm_zone: None,
            southern_hemisphere: false,
            max_fallback_distance_m: None,
            cache_ttl_secs: 600,
            cache_capacity: 16,
        }
    }
}

impl SurfaceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SURFACE_RESOLUTION") {
            if let Ok(n) = val.parse() {
                config.resolution = n;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_VALUE_FLOOR") {
            if let Ok(v) = val.parse() {
                config.value_floor = v;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_VALUE_CEILING") {
            if let Ok(v) = val.parse() {
                config.value_ceiling = v;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_VARIOGRAM_MODELS") {
            let models = VariogramModel::parse_list(&val);
            if !models.is_empty() {
                config.variogram_models = models;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_VARIOGRAM_LAGS") {
            if let Ok(n) = val.parse() {
                config.variogram_lags = n;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_UTM_ZONE") {
            // "43" or "43S"
            let trimmed = val.trim();
            let (digits, south) = match trimmed.strip_suffix(['S', 's']) {
                Some(d) => (d, true),
                None => (trimmed.trim_end_matches(['N', 'n']), false),
            };
            if let Ok(zone) = digits.parse() {
                config.utm_zone = Some(zone);
                config.southern_hemisphere = south;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_MAX_FALLBACK_DISTANCE_M") {
            if let Ok(m) = val.parse() {
                config.max_fallback_distance_m = Some(m);
            }
        }

        if let Ok(val) = std::env::var("SURFACE_CACHE_TTL_SECS") {
            if let Ok(secs) = val.parse() {
                config.cache_ttl_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("SURFACE_CACHE_CAPACITY") {
            if let Ok(n) = val.parse() {
                config.cache_capacity = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SurfaceResult<()> {
        if self.resolution < 2 {
            return Err(SurfaceError::InvalidResolution(self.resolution));
        }

        if !self.value_floor.is_finite()
            || !self.value_ceiling.is_finite()
            || self.value_floor > self.value_ceiling
        {
            return Err(SurfaceError::Config(format!(
                "value clamp [{}, {}] is not a finite ordered range",
                self.value_floor, self.value_ceiling
            )));
        }

        if self.variogram_models.is_empty() {
            return Err(SurfaceError::Config(
                "at least one variogram model is required".to_string(),
            ));
        }

        if self.variogram_lags == 0 {
            return Err(SurfaceError::Config("variogram_lags must be > 0".to_string()));
        }

        if let Some(zone) = self.utm_zone {
            if !(1..=60).contains(&zone) {
                return Err(SurfaceError::Config(format!(
                    "utm_zone must be 1-60, got {}",
                    zone
                )));
            }
        }

        if let Some(m) = self.max_fallback_distance_m {
            if !m.is_finite() || m <= 0.0 {
                return Err(SurfaceError::Config(format!(
                    "max_fallback_distance_m must be positive, got {}",
                    m
                )));
            }
        }

        if self.cache_capacity == 0 {
            return Err(SurfaceError::Config("cache_capacity must be > 0".to_string()));
        }

        Ok(())
    }

    /// Clamp a prediction into the configured value range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.value_floor, self.value_ceiling)
    }
}
