//! Public API surface for log density problems.
//!
//! - [`LogDensityProblem`]: the object-safe contract every density
//!   implements (dimension, value, optional gradient).
//! - [`DifferentiableLogDensity`]: evaluation over a generic [`Real`] scalar,
//!   which lets dual-number and tape engines differentiate a density.
//! - Free functions [`dimension`], [`capabilities`], [`logdensity`] and
//!   [`logdensity_and_gradient`]: contract-checking entry points for generic
//!   callers.
//! - [`FnLogDensity`]: adapter for value-only closures.
//!
//! Convention: log densities may be shifted by an additive constant, as long
//! as the constant is the same for every call on one object.
use std::sync::Arc;

use crate::{
    autodiff::real::Real,
    problems::{
        capability::LogDensityOrder,
        errors::{DensityError, DensityResult},
        types::Grad,
        validation::{validate_capability, validate_dimension, validate_gradient},
    },
};

/// User-implemented log density interface.
///
/// Required:
/// - `dimension() -> usize`: length of every input vector; must not change
///   over the lifetime of the object.
/// - `logdensity(&[f64]) -> DensityResult<f64>`: evaluate `ℓ(x)`.
///   - Returns `-inf` for infeasible points; `NaN` is valid but degenerate.
///   - Errors: [`DensityError::DimensionMismatch`] for wrong lengths, or a
///     descriptive error for points the density cannot evaluate.
///
/// Optional:
/// - `capabilities() -> LogDensityOrder`: defaults to `Order0`.
/// - `logdensity_and_gradient(&[f64]) -> DensityResult<(f64, Grad)>`: value
///   and gradient from one call. Must be implemented when `capabilities()`
///   returns `Order1`; the default reports
///   [`DensityError::UnsupportedCapability`].
///
/// Evaluation must not mutate the object. Implementations that are `Sync`
/// can be evaluated from several threads at once.
pub trait LogDensityProblem {
    // Required methods
    fn dimension(&self) -> usize;
    fn logdensity(&self, x: &[f64]) -> DensityResult<f64>;

    // Optional methods
    fn capabilities(&self) -> LogDensityOrder {
        LogDensityOrder::Order0
    }

    fn logdensity_and_gradient(&self, _x: &[f64]) -> DensityResult<(f64, Grad)> {
        Err(DensityError::UnsupportedCapability {
            required: LogDensityOrder::Order1,
            available: self.capabilities(),
        })
    }
}

/// Log density that can be evaluated over any [`Real`] scalar.
///
/// Implement this (in addition to [`LogDensityProblem`]) to let the
/// forward-mode and reverse-mode engines differentiate the density. The
/// `f64` instance must agree with [`LogDensityProblem::logdensity`]; the
/// usual implementation of `logdensity` simply calls
/// `self.logdensity_real(x)` after the dimension check.
pub trait DifferentiableLogDensity: LogDensityProblem {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S>;
}

// ---- Forwarding implementations -------------------------------------------

impl<P: LogDensityProblem + ?Sized> LogDensityProblem for &P {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        (**self).logdensity(x)
    }

    fn capabilities(&self) -> LogDensityOrder {
        (**self).capabilities()
    }

    fn logdensity_and_gradient(&self, x: &[f64]) -> DensityResult<(f64, Grad)> {
        (**self).logdensity_and_gradient(x)
    }
}

impl<P: LogDensityProblem + ?Sized> LogDensityProblem for Box<P> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        (**self).logdensity(x)
    }

    fn capabilities(&self) -> LogDensityOrder {
        (**self).capabilities()
    }

    fn logdensity_and_gradient(&self, x: &[f64]) -> DensityResult<(f64, Grad)> {
        (**self).logdensity_and_gradient(x)
    }
}

impl<P: LogDensityProblem + ?Sized> LogDensityProblem for Arc<P> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        (**self).logdensity(x)
    }

    fn capabilities(&self) -> LogDensityOrder {
        (**self).capabilities()
    }

    fn logdensity_and_gradient(&self, x: &[f64]) -> DensityResult<(f64, Grad)> {
        (**self).logdensity_and_gradient(x)
    }
}

impl<P: DifferentiableLogDensity> DifferentiableLogDensity for &P {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        (**self).logdensity_real(x)
    }
}

impl<P: DifferentiableLogDensity> DifferentiableLogDensity for Box<P> {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        (**self).logdensity_real(x)
    }
}

impl<P: DifferentiableLogDensity> DifferentiableLogDensity for Arc<P> {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        (**self).logdensity_real(x)
    }
}

// ---- Contract-checking entry points ---------------------------------------

/// Dimension of the input vectors accepted by `problem`.
pub fn dimension<P: LogDensityProblem + ?Sized>(problem: &P) -> usize {
    problem.dimension()
}

/// Highest derivative order `problem` supports. Never evaluates the density.
pub fn capabilities<P: LogDensityProblem + ?Sized>(problem: &P) -> LogDensityOrder {
    problem.capabilities()
}

/// Evaluate the log density of `problem` at `x`.
///
/// # Errors
/// - [`DensityError::DimensionMismatch`] before any evaluation when
///   `x.len() != dimension(problem)`.
/// - Any error raised by the density itself.
pub fn logdensity<P: LogDensityProblem + ?Sized>(problem: &P, x: &[f64]) -> DensityResult<f64> {
    validate_dimension(problem.dimension(), x)?;
    problem.logdensity(x)
}

/// Evaluate the log density of `problem` and its gradient at `x`.
///
/// # Errors
/// - [`DensityError::DimensionMismatch`] for wrong input lengths.
/// - [`DensityError::UnsupportedCapability`] when `problem` is value-only;
///   raised without evaluating anything.
/// - [`DensityError::GradientDimMismatch`] when a finite value comes with a
///   gradient of the wrong length.
/// - Any error raised by the density itself.
pub fn logdensity_and_gradient<P: LogDensityProblem + ?Sized>(
    problem: &P, x: &[f64],
) -> DensityResult<(f64, Grad)> {
    let dim = problem.dimension();
    validate_dimension(dim, x)?;
    validate_capability(problem.capabilities(), LogDensityOrder::Order1)?;
    let (value, grad) = problem.logdensity_and_gradient(x)?;
    validate_gradient(value, &grad, dim)?;
    Ok((value, grad))
}

// ---- Closure adapter ------------------------------------------------------

/// Value-only density built from a closure and a fixed dimension.
///
/// The closure receives inputs whose length has already been checked.
/// `FnLogDensity` does not implement [`DifferentiableLogDensity`]; wrap it
/// with the finite-difference backend to obtain gradients.
#[derive(Clone)]
pub struct FnLogDensity<F> {
    dimension: usize,
    f: F,
}

impl<F> FnLogDensity<F>
where
    F: Fn(&[f64]) -> DensityResult<f64>,
{
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<F> std::fmt::Debug for FnLogDensity<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnLogDensity").field("dimension", &self.dimension).finish_non_exhaustive()
    }
}

impl<F> LogDensityProblem for FnLogDensity<F>
where
    F: Fn(&[f64]) -> DensityResult<f64>,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        validate_dimension(self.dimension, x)?;
        (self.f)(x)
    }
}
