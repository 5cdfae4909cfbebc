//! Ordinary kriging over planar station coordinates.
//!
//! For `M` stations the bordered system
//!
//! ```text
//! | γ(d_11) … γ(d_1M)  1 | | λ_1 |   | γ(d_10) |
//! |   ⋮         ⋮      ⋮ | |  ⋮  | = |    ⋮    |
//! | γ(d_M1) … γ(d_MM)  1 | | λ_M |   | γ(d_M0) |
//! |   1     …   1      0 | |  μ  |   |    1    |
//! ```
//!
//! is inverted once per fit, with `γ(0) = 0` on the diagonal. Each site then
//! costs one matrix-vector product. The prediction is `Σ λ_i z_i` and the
//! estimation variance is `Σ λ_i γ(d_i0) + μ`.
//!
//! A site that coincides with a station gets that station's value exactly.

use aq_common::{SurfaceError, SurfaceResult, MIN_STATIONS};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::SurfaceConfig;
use crate::variogram::{ExperimentalVariogram, VariogramModel, VariogramParams};

/// Distances at or below this (meters) count as coincident. Larger than the
/// projection round-trip error, so a station placed on a back-projected
/// lattice site still lands on it.
const EXACT_DISTANCE_M: f64 = 1e-2;

/// Largest tolerated entry of `A·A⁻¹ - I`.
const MAX_INVERSE_RESIDUAL: f64 = 1e-6;

/// Kriged estimate at one site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub variance: f64,
}

impl Prediction {
    fn is_finite(&self) -> bool {
        self.value.is_finite() && self.variance.is_finite()
    }
}

/// A fitted ordinary kriging system.
#[derive(Debug, Clone)]
pub struct OrdinaryKriging {
    points: Vec<(f64, f64)>,
    values: Vec<f64>,
    params: VariogramParams,
    inverse: DMatrix<f64>,
}

impl OrdinaryKriging {
    /// Estimate the variogram with `model` and build the kriging system.
    pub fn fit(
        points: &[(f64, f64)],
        values: &[f64],
        model: VariogramModel,
        nlags: usize,
    ) -> SurfaceResult<Self> {
        let experimental = ExperimentalVariogram::compute(points, values, nlags)?;
        let params = model.fit(&experimental);
        debug!(?params, lags = experimental.len(), "Fitted variogram");
        Self::with_params(points, values, params)
    }

    /// Build the kriging system for an already fitted variogram.
    ///
    /// Fails with `InterpolationFailure` when the system is singular or too
    /// ill-conditioned to invert reliably.
    pub fn with_params(
        points: &[(f64, f64)],
        values: &[f64],
        params: VariogramParams,
    ) -> SurfaceResult<Self> {
        if points.len() != values.len() {
            return Err(SurfaceError::invalid_input(format!(
                "{} points but {} values",
                points.len(),
                values.len()
            )));
        }

        let n = points.len();
        let size = n + 1;
        let mut system = DMatrix::<f64>::zeros(size, size);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    system[(i, j)] = semivariance(&params, distance(points[i], points[j]));
                }
            }
            system[(i, n)] = 1.0;
            system[(n, i)] = 1.0;
        }

        let inverse = system.clone().try_inverse().ok_or_else(|| {
            SurfaceError::InterpolationFailure(format!(
                "{} kriging system is singular",
                params.model()
            ))
        })?;

        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(SurfaceError::InterpolationFailure(format!(
                "{} kriging inverse has non-finite entries",
                params.model()
            )));
        }

        let residual = (&system * &inverse - DMatrix::<f64>::identity(size, size)).amax();
        if !(residual <= MAX_INVERSE_RESIDUAL) {
            return Err(SurfaceError::InterpolationFailure(format!(
                "{} kriging system is ill-conditioned (residual {:e})",
                params.model(),
                residual
            )));
        }

        Ok(Self {
            points: points.to_vec(),
            values: values.to_vec(),
            params,
            inverse,
        })
    }

    pub fn params(&self) -> &VariogramParams {
        &self.params
    }

    /// Krige a single planar site.
    pub fn predict_point(&self, x: f64, y: f64) -> Prediction {
        let n = self.points.len();
        let mut rhs = DVector::<f64>::zeros(n + 1);
        for (i, &p) in self.points.iter().enumerate() {
            rhs[i] = semivariance(&self.params, distance(p, (x, y)));
        }
        rhs[n] = 1.0;

        let weights = &self.inverse * &rhs;

        let mut value = 0.0;
        let mut variance = weights[n];
        for i in 0..n {
            value += weights[i] * self.values[i];
            variance += weights[i] * rhs[i];
        }

        Prediction {
            value,
            variance: variance.max(0.0),
        }
    }

    /// Krige many planar sites in parallel. Output order matches `sites`.
    pub fn predict(&self, sites: &[(f64, f64)]) -> Vec<Prediction> {
        sites
            .par_iter()
            .map(|&(x, y)| self.predict_point(x, y))
            .collect()
    }
}

/// One way of turning stations into site predictions.
pub trait InterpolationStrategy: Send + Sync + std::fmt::Debug {
    /// Short label used in logs and output metadata.
    fn name(&self) -> String;

    /// Predict every site. Unclamped.
    fn interpolate(
        &self,
        points: &[(f64, f64)],
        values: &[f64],
        sites: &[(f64, f64)],
    ) -> SurfaceResult<StrategyOutput>;
}

/// Successful strategy result.
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    pub predictions: Vec<Prediction>,
    pub description: String,
}

/// Ordinary kriging with a fitted variogram of one family.
#[derive(Debug, Clone, Copy)]
pub struct VariogramStrategy {
    pub model: VariogramModel,
    pub nlags: usize,
}

impl InterpolationStrategy for VariogramStrategy {
    fn name(&self) -> String {
        self.model.to_string()
    }

    fn interpolate(
        &self,
        points: &[(f64, f64)],
        values: &[f64],
        sites: &[(f64, f64)],
    ) -> SurfaceResult<StrategyOutput> {
        let kriging = OrdinaryKriging::fit(points, values, self.model, self.nlags)?;
        let predictions = kriging.predict(sites);

        if let Some(bad) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(SurfaceError::InterpolationFailure(format!(
                "{} kriging produced a non-finite estimate at site {}",
                self.model, bad
            )));
        }

        Ok(StrategyOutput {
            predictions,
            description: format!("{:?}", kriging.params()),
        })
    }
}

/// Result of a successful interpolation run.
#[derive(Debug, Clone)]
pub struct InterpolationOutput {
    /// Clamped predictions, one per site.
    pub predictions: Vec<Prediction>,
    /// Name of the strategy that produced them.
    pub strategy: String,
    /// Fitted parameters or other strategy detail.
    pub description: String,
}

/// Tries strategies in order and clamps the first successful result.
#[derive(Debug)]
pub struct SpatialInterpolator {
    strategies: Vec<Box<dyn InterpolationStrategy>>,
    value_floor: f64,
    value_ceiling: f64,
}

impl SpatialInterpolator {
    pub fn new(
        strategies: Vec<Box<dyn InterpolationStrategy>>,
        value_floor: f64,
        value_ceiling: f64,
    ) -> Self {
        Self {
            strategies,
            value_floor,
            value_ceiling,
        }
    }

    /// Variogram strategies in the configured order.
    pub fn from_config(config: &SurfaceConfig) -> Self {
        let strategies = config
            .variogram_models
            .iter()
            .map(|&model| {
                Box::new(VariogramStrategy {
                    model,
                    nlags: config.variogram_lags,
                }) as Box<dyn InterpolationStrategy>
            })
            .collect();
        Self::new(strategies, config.value_floor, config.value_ceiling)
    }

    /// Predict every site from the stations.
    ///
    /// Input errors abort immediately. `InterpolationFailure` from one
    /// strategy moves on to the next; only when all fail is it returned.
    pub fn interpolate(
        &self,
        points: &[(f64, f64)],
        values: &[f64],
        sites: &[(f64, f64)],
    ) -> SurfaceResult<InterpolationOutput> {
        if points.len() != values.len() {
            return Err(SurfaceError::invalid_input(format!(
                "{} points but {} values",
                points.len(),
                values.len()
            )));
        }

        let (points, values) = merge_coincident(points, values);
        if points.len() < MIN_STATIONS {
            return Err(SurfaceError::insufficient(format!(
                "{} distinct station positions, at least {} required",
                points.len(),
                MIN_STATIONS
            )));
        }

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.interpolate(&points, &values, sites) {
                Ok(output) => {
                    if !failures.is_empty() {
                        warn!(
                            strategy = %strategy.name(),
                            skipped = failures.len(),
                            "Interpolation succeeded after fallback"
                        );
                    }
                    let raw = value_range(output.predictions.iter().map(|p| p.value));
                    let predictions: Vec<Prediction> = output
                        .predictions
                        .into_iter()
                        .map(|p| Prediction {
                            value: p.value.clamp(self.value_floor, self.value_ceiling),
                            variance: p.variance,
                        })
                        .collect();
                    let clamped = value_range(predictions.iter().map(|p| p.value));
                    debug!(
                        strategy = %strategy.name(),
                        raw = ?raw,
                        clamped = ?clamped,
                        "Prediction range"
                    );
                    return Ok(InterpolationOutput {
                        predictions,
                        strategy: strategy.name(),
                        description: output.description,
                    });
                }
                Err(SurfaceError::InterpolationFailure(reason)) => {
                    warn!(strategy = %strategy.name(), reason = %reason, "Interpolation strategy failed");
                    failures.push(format!("{}: {}", strategy.name(), reason));
                }
                Err(e) => return Err(e),
            }
        }

        Err(SurfaceError::InterpolationFailure(if failures.is_empty() {
            "no interpolation strategies configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

/// Collapse stations closer than the coincidence distance into one station
/// carrying their mean value. Coincident stations would otherwise make two
/// rows of the kriging system identical.
///
/// Each station joins the first earlier group whose anchor lies within
/// reach, so the result depends only on input order.
pub fn merge_coincident(points: &[(f64, f64)], values: &[f64]) -> (Vec<(f64, f64)>, Vec<f64>) {
    let mut anchors: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    let mut sums: Vec<(f64, usize)> = Vec::with_capacity(points.len());

    for (&p, &z) in points.iter().zip(values) {
        match anchors
            .iter()
            .position(|&a| distance(a, p) <= EXACT_DISTANCE_M)
        {
            Some(group) => {
                sums[group].0 += z;
                sums[group].1 += 1;
            }
            None => {
                anchors.push(p);
                sums.push((z, 1));
            }
        }
    }

    if anchors.len() < points.len() {
        debug!(
            supplied = points.len(),
            distinct = anchors.len(),
            "Merged coincident stations"
        );
    }

    let values = sums.into_iter().map(|(sum, n)| sum / n as f64).collect();
    (anchors, values)
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

fn semivariance(params: &VariogramParams, h: f64) -> f64 {
    if h <= EXACT_DISTANCE_M {
        0.0
    } else {
        params.evaluate(h)
    }
}
