//! diagnostics::stress — random stress testing of log densities.
//!
//! Purpose
//! -------
//! Probe a density at many heavy-tailed random points and collect every
//! point where evaluation failed, so that numerical fragility shows up
//! before a sampler hits it.
//!
//! Key behaviors
//! -------------
//! - Each coordinate of each draw is Cauchy(0, scaleᵢ); the heavy tails
//!   reach far into the domain while most draws stay near the origin.
//! - The caller's function (`logdensity`, `logdensity_and_gradient`, or any
//!   closure with the same shape) is invoked on every draw. Errors and
//!   panics are recorded per draw; the run never stops early.
//! - Failures are returned in draw order. Identical seed, count and scale
//!   reproduce identical failures.
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration errors (`InvalidScale`, per-axis `DimensionMismatch`) are
//!   reported before any draw.
//! - Panics are caught with `catch_unwind`; the default panic hook still
//!   prints them to stderr.
use std::panic::{self, AssertUnwindSafe};

use log::info;
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Cauchy, Distribution};

use crate::problems::{
    errors::{DensityError, DensityResult},
    traits::LogDensityProblem,
    types::Theta,
};

/// Default number of draws.
pub const DEFAULT_STRESS_COUNT: usize = 1000;

/// Scale of the Cauchy draws.
///
/// - `Scalar(s)`: the same scale on every axis (default `1.0`).
/// - `PerAxis(v)`: one scale per axis; `v.len()` must equal the dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum StressScale {
    Scalar(f64),
    PerAxis(Vec<f64>),
}

impl Default for StressScale {
    fn default() -> Self {
        StressScale::Scalar(1.0)
    }
}

impl StressScale {
    fn validate(&self) -> DensityResult<()> {
        let values: &[f64] = match self {
            StressScale::Scalar(s) => std::slice::from_ref(s),
            StressScale::PerAxis(v) => v,
        };
        for (index, &value) in values.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(DensityError::InvalidScale {
                    index,
                    value,
                    reason: "scale must be finite and strictly positive",
                });
            }
        }
        Ok(())
    }

    fn per_axis(&self, dim: usize) -> DensityResult<Vec<f64>> {
        self.validate()?;
        match self {
            StressScale::Scalar(s) => Ok(vec![*s; dim]),
            StressScale::PerAxis(v) if v.len() == dim => Ok(v.clone()),
            StressScale::PerAxis(v) => Err(DensityError::DimensionMismatch { expected: dim, found: v.len() }),
        }
    }
}

/// Stress-test configuration.
///
/// Fields:
/// - `count: usize`: number of draws (default 1000).
/// - `scale: StressScale`: Cauchy scale (default `Scalar(1.0)`).
#[derive(Debug, Clone, PartialEq)]
pub struct StressOptions {
    pub count: usize,
    pub scale: StressScale,
}

impl StressOptions {
    /// # Errors
    /// Returns [`DensityError::InvalidScale`] for non-finite or non-positive
    /// scales.
    pub fn new(count: usize, scale: StressScale) -> DensityResult<Self> {
        scale.validate()?;
        Ok(StressOptions { count, scale })
    }
}

impl Default for StressOptions {
    fn default() -> Self {
        StressOptions { count: DEFAULT_STRESS_COUNT, scale: StressScale::default() }
    }
}

/// One failed evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct StressFailure {
    pub x: Theta,
    pub error: DensityError,
}

/// Evaluate `f(problem, x)` at `options.count` Cauchy draws from `rng` and
/// return the failures in draw order.
///
/// # Errors
/// - [`DensityError::InvalidScale`] for invalid scales.
/// - [`DensityError::DimensionMismatch`] when a per-axis scale vector does
///   not match `problem.dimension()`.
pub fn stresstest<P, T, F, R>(
    f: F, problem: &P, options: &StressOptions, rng: &mut R,
) -> DensityResult<Vec<StressFailure>>
where
    P: LogDensityProblem + ?Sized,
    F: Fn(&P, &[f64]) -> DensityResult<T>,
    R: Rng + ?Sized,
{
    let dim = problem.dimension();
    let scales = options.scale.per_axis(dim)?;
    let axes = scales
        .iter()
        .enumerate()
        .map(|(index, &s)| {
            Cauchy::new(0.0, s).map_err(|_| DensityError::InvalidScale {
                index,
                value: s,
                reason: "scale rejected by the Cauchy distribution",
            })
        })
        .collect::<DensityResult<Vec<Cauchy<f64>>>>()?;

    let mut failures = Vec::new();
    let mut draw = vec![0.0; dim];
    for _ in 0..options.count {
        for (xi, axis) in draw.iter_mut().zip(&axes) {
            *xi = axis.sample(rng);
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(problem, &draw)));
        let error = match outcome {
            Ok(Ok(_)) => continue,
            Ok(Err(error)) => error,
            Err(payload) => DensityError::EvaluationPanic { message: panic_message(payload.as_ref()) },
        };
        failures.push(StressFailure { x: Array1::from(draw.clone()), error });
    }

    info!("stresstest: {} failures in {} draws (dimension {dim})", failures.len(), options.count);
    Ok(failures)
}

/// [`stresstest`] with a `ChaCha8Rng` seeded from `seed`.
pub fn stresstest_seeded<P, T, F>(
    f: F, problem: &P, options: &StressOptions, seed: u64,
) -> DensityResult<Vec<StressFailure>>
where
    P: LogDensityProblem + ?Sized,
    F: Fn(&P, &[f64]) -> DensityResult<T>,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    stresstest(f, problem, options, &mut rng)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
