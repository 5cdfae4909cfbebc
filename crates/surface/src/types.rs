//! Core types for prediction grids and cache statistics.

use serde::{Deserialize, Serialize};

/// Masked prediction grid.
///
/// Flat row-major arrays of `resolution²` entries. A site outside the
/// region boundary has `None` for both value and variance.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionGrid {
    pub resolution: usize,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub values: Vec<Option<f64>>,
    pub variances: Vec<Option<f64>>,
}

/// One site of a prediction grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSite {
    pub lon: f64,
    pub lat: f64,
    pub value: Option<f64>,
    pub variance: Option<f64>,
}

impl PredictionGrid {
    /// Total number of sites.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat index of `(row, col)`.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.resolution + col
    }

    /// Site at `(row, col)`, or `None` when out of range.
    pub fn site(&self, row: usize, col: usize) -> Option<GridSite> {
        if row >= self.resolution || col >= self.resolution {
            return None;
        }
        let idx = self.index(row, col);
        Some(GridSite {
            lon: self.lons[idx],
            lat: self.lats[idx],
            value: self.values[idx],
            variance: self.variances[idx],
        })
    }

    /// Iterate all sites in row-major order.
    pub fn sites(&self) -> impl Iterator<Item = GridSite> + '_ {
        (0..self.len()).map(move |idx| GridSite {
            lon: self.lons[idx],
            lat: self.lats[idx],
            value: self.values[idx],
            variance: self.variances[idx],
        })
    }

    /// Number of sites carrying a value.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// `(min, max)` over valid values, `None` when every site is masked.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Nested `resolution × resolution` view for serialization.
    pub fn to_export(&self, crs: &str, method: &str) -> GridExport {
        GridExport {
            resolution: self.resolution,
            crs: crs.to_string(),
            method: method.to_string(),
            lon: to_rows(&self.lons, self.resolution),
            lat: to_rows(&self.lats, self.resolution),
            value: to_rows(&self.values, self.resolution),
            variance: to_rows(&self.variances, self.resolution),
        }
    }
}

/// Serialized grid: 2-D arrays indexed `[row][col]`, masked sites as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridExport {
    pub resolution: usize,
    pub crs: String,
    pub method: String,
    pub lon: Vec<Vec<f64>>,
    pub lat: Vec<Vec<f64>>,
    pub value: Vec<Vec<Option<f64>>>,
    pub variance: Vec<Vec<Option<f64>>>,
}

fn to_rows<T: Clone>(flat: &[T], resolution: usize) -> Vec<Vec<T>> {
    if resolution == 0 {
        return Vec::new();
    }
    flat.chunks(resolution).map(|row| row.to_vec()).collect()
}

/// Surface cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Surfaces actually computed (at most one per key per miss burst).
    pub computations: u64,
    pub expirations: u64,
    pub evictions: u64,
    /// Digest matches whose stored inputs differed.
    pub collisions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
