//! Semivariogram estimation and model fitting.
//!
//! The experimental variogram bins every station pair by planar distance
//! into `nlags` equal-width bins between the smallest and largest pair
//! distance. Each non-empty bin contributes its mean distance and its mean
//! semivariance `0.5 * (z_i - z_j)²`.
//!
//! Models are fitted to those points by box-constrained least squares:
//!
//! - `Linear`: `γ(h) = slope * h + nugget`, `slope ≥ 0`, `0 ≤ nugget ≤ max γ`
//! - `Spherical`: `γ(h) = psill * (1.5 h/r - 0.5 (h/r)³) + nugget` below the
//!   range `r`, `psill + nugget` beyond it; `0 < r ≤ max lag`,
//!   `0 ≤ psill ≤ 10 max γ`, `0 ≤ nugget ≤ max γ`
//!
//! The fits are closed-form or a fixed grid search, so the same input
//! always yields the same parameters.

use aq_common::{SurfaceError, SurfaceResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Range candidates evaluated by the spherical grid search.
const SPHERICAL_RANGE_STEPS: usize = 200;

/// Widening of the last bin so the largest pair distance falls inside it.
const LAST_BIN_PAD: f64 = 0.001;

/// Variogram model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariogramModel {
    Linear,
    Spherical,
}

impl VariogramModel {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "spherical" => Some(Self::Spherical),
            _ => None,
        }
    }

    /// Parse a comma-separated list, skipping unknown names.
    pub fn parse_list(s: &str) -> Vec<Self> {
        s.split(',').filter_map(Self::from_str).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Spherical => "spherical",
        }
    }

    fn unit_params(&self, max_lag: f64) -> VariogramParams {
        match self {
            Self::Linear => VariogramParams::Linear {
                slope: 1.0,
                nugget: 0.0,
            },
            Self::Spherical => VariogramParams::Spherical {
                psill: 1.0,
                range: max_lag,
                nugget: 0.0,
            },
        }
    }

    /// Fit this model family to an experimental variogram.
    pub fn fit(&self, experimental: &ExperimentalVariogram) -> VariogramParams {
        let max_gamma = experimental.max_semivariance();
        let max_lag = experimental.max_lag();

        // A flat field has zero semivariance everywhere. Any positive scale
        // gives the same kriging weights, so fall back to a unit model.
        if max_gamma <= 0.0 {
            debug!(model = self.as_str(), "Flat semivariance, using unit model");
            return self.unit_params(max_lag);
        }

        let lags = experimental.lags();
        let gamma = experimental.semivariance();

        let params = match self {
            Self::Linear => {
                let fit = fit_affine_bounded(lags, gamma, f64::INFINITY, max_gamma);
                VariogramParams::Linear {
                    slope: fit.scale,
                    nugget: fit.offset,
                }
            }
            Self::Spherical => {
                let mut best: Option<(f64, AffineFit)> = None;
                for step in 1..=SPHERICAL_RANGE_STEPS {
                    let range = max_lag * step as f64 / SPHERICAL_RANGE_STEPS as f64;
                    let basis: Vec<f64> = lags.iter().map(|&h| spherical_shape(h, range)).collect();
                    let fit = fit_affine_bounded(&basis, gamma, 10.0 * max_gamma, max_gamma);
                    if best.as_ref().map_or(true, |(_, b)| fit.sse < b.sse) {
                        best = Some((range, fit));
                    }
                }
                match best {
                    Some((range, fit)) => VariogramParams::Spherical {
                        psill: fit.scale,
                        range,
                        nugget: fit.offset,
                    },
                    None => VariogramParams::Spherical {
                        psill: max_gamma,
                        range: max_lag,
                        nugget: 0.0,
                    },
                }
            }
        };

        if params.is_degenerate() {
            debug!(model = self.as_str(), "Degenerate fit, using unit model");
            return self.unit_params(max_lag);
        }

        params
    }
}

impl std::fmt::Display for VariogramModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fitted variogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum VariogramParams {
    Linear { slope: f64, nugget: f64 },
    Spherical { psill: f64, range: f64, nugget: f64 },
}

impl VariogramParams {
    pub fn model(&self) -> VariogramModel {
        match self {
            Self::Linear { .. } => VariogramModel::Linear,
            Self::Spherical { .. } => VariogramModel::Spherical,
        }
    }

    /// Model semivariance at planar distance `h` (meters).
    pub fn evaluate(&self, h: f64) -> f64 {
        match *self {
            Self::Linear { slope, nugget } => slope * h + nugget,
            Self::Spherical {
                psill,
                range,
                nugget,
            } => psill * spherical_shape(h, range) + nugget,
        }
    }

    /// All structural terms are zero, which makes the kriging system singular.
    fn is_degenerate(&self) -> bool {
        match *self {
            Self::Linear { slope, nugget } => slope <= 0.0 && nugget <= 0.0,
            Self::Spherical {
                psill,
                range,
                nugget,
            } => (psill <= 0.0 || range <= 0.0) && nugget <= 0.0,
        }
    }
}

/// Binned semivariance of a station set.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalVariogram {
    lags: Vec<f64>,
    semivariance: Vec<f64>,
}

impl ExperimentalVariogram {
    /// Bin all station pairs into `nlags` distance classes.
    pub fn compute(points: &[(f64, f64)], values: &[f64], nlags: usize) -> SurfaceResult<Self> {
        if points.len() != values.len() {
            return Err(SurfaceError::invalid_input(format!(
                "{} points but {} values",
                points.len(),
                values.len()
            )));
        }
        if points.len() < 2 {
            return Err(SurfaceError::insufficient(
                "at least two stations are needed for a variogram",
            ));
        }
        if nlags == 0 {
            return Err(SurfaceError::invalid_input("nlags must be > 0"));
        }

        let pair_count = points.len() * (points.len() - 1) / 2;
        let mut distances = Vec::with_capacity(pair_count);
        let mut halves = Vec::with_capacity(pair_count);
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let dx = points[i].0 - points[j].0;
                let dy = points[i].1 - points[j].1;
                let dz = values[i] - values[j];
                distances.push((dx * dx + dy * dy).sqrt());
                halves.push(0.5 * dz * dz);
            }
        }

        let d_min = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let d_max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (d_max - d_min) / nlags as f64;

        let mut edges: Vec<f64> = (0..nlags).map(|n| d_min + width * n as f64).collect();
        edges.push(d_max + LAST_BIN_PAD);

        let mut lags = Vec::with_capacity(nlags);
        let mut semivariance = Vec::with_capacity(nlags);
        for bin in 0..nlags {
            let (lo, hi) = (edges[bin], edges[bin + 1]);
            let mut sum_d = 0.0;
            let mut sum_g = 0.0;
            let mut count = 0usize;
            for (d, g) in distances.iter().zip(&halves) {
                if *d >= lo && *d < hi {
                    sum_d += d;
                    sum_g += g;
                    count += 1;
                }
            }
            if count > 0 {
                lags.push(sum_d / count as f64);
                semivariance.push(sum_g / count as f64);
            }
        }

        Ok(Self { lags, semivariance })
    }

    /// Mean pair distance of each non-empty bin.
    pub fn lags(&self) -> &[f64] {
        &self.lags
    }

    /// Mean semivariance of each non-empty bin.
    pub fn semivariance(&self) -> &[f64] {
        &self.semivariance
    }

    pub fn len(&self) -> usize {
        self.lags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }

    pub fn max_lag(&self) -> f64 {
        self.lags.iter().copied().fold(0.0, f64::max)
    }

    pub fn max_semivariance(&self) -> f64 {
        self.semivariance.iter().copied().fold(0.0, f64::max)
    }
}

/// Normalized spherical structure: rises from 0 to 1 at `range`.
fn spherical_shape(h: f64, range: f64) -> f64 {
    if range <= 0.0 || h >= range {
        1.0
    } else {
        let r = h / range;
        1.5 * r - 0.5 * r * r * r
    }
}

#[derive(Debug, Clone, Copy)]
struct AffineFit {
    scale: f64,
    offset: f64,
    sse: f64,
}

/// Least squares for `g ≈ scale * f + offset` with `0 ≤ scale ≤ scale_max`
/// and `0 ≤ offset ≤ offset_max`.
///
/// The objective is a convex quadratic, so when the unconstrained optimum
/// is infeasible the constrained one lies on an edge of the box, where the
/// problem reduces to a clamped one-dimensional fit.
fn fit_affine_bounded(f: &[f64], g: &[f64], scale_max: f64, offset_max: f64) -> AffineFit {
    let n = f.len().max(1) as f64;
    let sse = |scale: f64, offset: f64| -> f64 {
        f.iter()
            .zip(g)
            .map(|(fi, gi)| {
                let r = scale * fi + offset - gi;
                r * r
            })
            .sum()
    };
    let feasible =
        |scale: f64, offset: f64| (0.0..=scale_max).contains(&scale) && (0.0..=offset_max).contains(&offset);

    let mean_f = f.iter().sum::<f64>() / n;
    let mean_g = g.iter().sum::<f64>() / n;
    let sxx: f64 = f.iter().map(|fi| (fi - mean_f) * (fi - mean_f)).sum();
    let sff: f64 = f.iter().map(|fi| fi * fi).sum();

    if sxx > 1e-12 * sff.max(1.0) {
        let sxy: f64 = f
            .iter()
            .zip(g)
            .map(|(fi, gi)| (fi - mean_f) * (gi - mean_g))
            .sum();
        let scale = sxy / sxx;
        let offset = mean_g - scale * mean_f;
        if feasible(scale, offset) {
            return AffineFit {
                scale,
                offset,
                sse: sse(scale, offset),
            };
        }
    }

    let scale_through = |offset: f64| -> f64 {
        if sff > 0.0 {
            let sfg: f64 = f.iter().zip(g).map(|(fi, gi)| fi * (gi - offset)).sum();
            (sfg / sff).clamp(0.0, scale_max)
        } else {
            0.0
        }
    };
    let offset_given = |scale: f64| -> f64 {
        let mean_resid = f.iter().zip(g).map(|(fi, gi)| gi - scale * fi).sum::<f64>() / n;
        mean_resid.clamp(0.0, offset_max)
    };

    // Order matters on ties: prefer structure over a pure nugget.
    let mut candidates = vec![
        (scale_through(0.0), 0.0),
        (0.0, offset_given(0.0)),
        (scale_through(offset_max), offset_max),
    ];
    if scale_max.is_finite() {
        candidates.push((scale_max, offset_given(scale_max)));
    }

    let mut best = AffineFit {
        scale: 0.0,
        offset: 0.0,
        sse: f64::INFINITY,
    };
    for (scale, offset) in candidates {
        let err = sse(scale, offset);
        if err < best.sse {
            best = AffineFit {
                scale,
                offset,
                sse: err,
            };
        }
    }
    best
}
