//! autodiff::finite_diff — finite-difference gradient engine.
//!
//! Purpose
//! -------
//! Differentiate densities that only evaluate over `f64` (closures, foreign
//! callables) by finite differences, without exposing the `finitediff` API
//! to the rest of the crate.
//!
//! Key behaviors
//! -------------
//! - The value at `x` is computed first and its error, if any, propagates
//!   unchanged. A non-finite value returns a zero gradient, which callers
//!   ignore.
//! - The central stencil is tried first; if a stencil evaluation fails or the
//!   central gradient contains non-finite entries, the forward stencil is
//!   used instead (logged at `warn`).
//! - When the forward stencil fails too, the engine returns
//!   [`DensityError::DifferentiationFailure`]. An error raised at a stencil
//!   point is quoted in its reason, never returned as a failure at `x`.
//!
//! Conventions
//! -----------
//! - Stencil-point errors are routed through a `RefCell<Option<DensityError>>`
//!   while `finitediff` drives the closure; the closure returns `NaN` in
//!   that case and only the first error is kept.
use std::cell::RefCell;

use finitediff::FiniteDiff;
use log::{trace, warn};
use ndarray::Array1;

use crate::{
    autodiff::backends::{ADBackend, ADOptions, EvaluateOperation, FiniteDiffScheme, GradientStrategy},
    problems::{
        errors::{DensityError, DensityResult},
        types::{Grad, Theta},
    },
};

/// Finite-difference engine over the `f64` entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FiniteDiffStrategy {
    scheme: FiniteDiffScheme,
}

impl FiniteDiffStrategy {
    /// # Errors
    /// Returns [`DensityError::InvalidBackendOption`] if `chunk` is set.
    pub fn from_options(options: &ADOptions, _dim: usize) -> DensityResult<Self> {
        if options.chunk.is_some() {
            return Err(DensityError::InvalidBackendOption {
                backend: ADBackend::FiniteDiff,
                option: "chunk",
                reason: "FiniteDiff does not use a chunk size.",
            });
        }
        Ok(FiniteDiffStrategy { scheme: options.fd_scheme.unwrap_or_default() })
    }

    pub fn scheme(&self) -> FiniteDiffScheme {
        self.scheme
    }
}

impl GradientStrategy for FiniteDiffStrategy {
    fn value_and_gradient(
        &self, op: &dyn EvaluateOperation, x: &[f64],
    ) -> DensityResult<(f64, Grad)> {
        let value = op.value(x)?;
        if !value.is_finite() {
            return Ok((value, Array1::zeros(x.len())));
        }

        let theta: Theta = Array1::from(x.to_vec());
        let grad = match self.scheme {
            FiniteDiffScheme::Forward => run_fd_diff(op, &theta, FiniteDiffScheme::Forward)?,
            FiniteDiffScheme::Central => match run_fd_diff(op, &theta, FiniteDiffScheme::Central) {
                Ok(grad) => grad,
                Err(err) => {
                    warn!("FiniteDiff: central differences failed ({err}); falling back to forward differences");
                    run_fd_diff(op, &theta, FiniteDiffScheme::Forward)?
                }
            },
        };
        trace!("FiniteDiff: dimension {}, scheme {:?}", x.len(), self.scheme);
        Ok((value, grad))
    }
}

/// run_fd_diff — one finite-difference gradient with error capture.
///
/// Returns the gradient at `theta` using `scheme`, or
/// [`DensityError::DifferentiationFailure`] when a stencil evaluation fails
/// (naming the first error raised) or the gradient contains a non-finite
/// entry.
fn run_fd_diff(
    op: &dyn EvaluateOperation, theta: &Theta, scheme: FiniteDiffScheme,
) -> DensityResult<Grad> {
    let closure_err: RefCell<Option<DensityError>> = RefCell::new(None);
    let func = |t: &Theta| match evaluate(op, t) {
        Ok(v) => v,
        Err(err) => {
            let mut slot = closure_err.borrow_mut();
            if slot.is_none() {
                *slot = Some(err);
            }
            f64::NAN
        }
    };

    let grad = match scheme {
        FiniteDiffScheme::Central => theta.central_diff(&func),
        FiniteDiffScheme::Forward => theta.forward_diff(&func),
    };
    if let Some(err) = closure_err.take() {
        return Err(DensityError::DifferentiationFailure {
            backend: ADBackend::FiniteDiff,
            reason: format!("{scheme:?} stencil evaluation failed: {err}"),
        });
    }
    if let Some((index, g)) = grad.iter().enumerate().find(|(_, g)| !g.is_finite()) {
        return Err(DensityError::DifferentiationFailure {
            backend: ADBackend::FiniteDiff,
            reason: format!("{scheme:?} difference for coordinate {index} is {g}"),
        });
    }
    Ok(grad)
}

fn evaluate(op: &dyn EvaluateOperation, t: &Theta) -> DensityResult<f64> {
    match t.as_slice() {
        Some(xs) => op.value(xs),
        None => op.value(&t.to_vec()),
    }
}
