//! Validation helpers for the log density contract.
//!
//! This module centralizes the consistency checks shared by densities,
//! wrappers and the harness:
//!
//! - **Dimension checks**: [`validate_dimension`] rejects input vectors whose
//!   length disagrees with the declared dimension.
//! - **Capability checks**: [`validate_capability`] rejects gradient requests
//!   on value-only densities before any evaluation happens.
//! - **Gradient checks**: [`validate_gradient`] enforces the gradient length
//!   whenever the paired value is finite.
//!
//! Every helper returns a [`DensityError`] variant describing the violation,
//! so callers can propagate with `?`.
use crate::problems::{
    capability::LogDensityOrder,
    errors::{DensityError, DensityResult},
    types::Grad,
};

/// Validate that an input vector matches the declared dimension.
///
/// Generic over the element type so that `f64`, dual and tape inputs share
/// one check.
///
/// # Errors
/// Returns [`DensityError::DimensionMismatch`] if `x.len() != dim`.
pub fn validate_dimension<T>(dim: usize, x: &[T]) -> DensityResult<()> {
    if x.len() != dim {
        return Err(DensityError::DimensionMismatch { expected: dim, found: x.len() });
    }
    Ok(())
}

/// Validate that `available` can service a request of order `required`.
///
/// # Errors
/// Returns [`DensityError::UnsupportedCapability`] otherwise.
pub fn validate_capability(
    available: LogDensityOrder, required: LogDensityOrder,
) -> DensityResult<()> {
    if !available.supports(required) {
        return Err(DensityError::UnsupportedCapability { required, available });
    }
    Ok(())
}

/// Validate a gradient returned alongside `value`.
///
/// The gradient is only meaningful when `value` is finite, so non-finite
/// values skip the check entirely. Gradient entries are not required to be
/// finite.
///
/// # Errors
/// Returns [`DensityError::GradientDimMismatch`] if the value is finite and
/// `grad.len() != dim`.
pub fn validate_gradient(value: f64, grad: &Grad, dim: usize) -> DensityResult<()> {
    if value.is_finite() && grad.len() != dim {
        return Err(DensityError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    Ok(())
}
