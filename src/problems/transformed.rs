//! problems::transformed — densities over unconstrained coordinates.
//!
//! Purpose
//! -------
//! Compose a [`Transformation`] from `ℝⁿ` to a structured parameter value
//! with a density over that parameter, so samplers can work on an
//! unconstrained vector.
//!
//! Key behaviors
//! -------------
//! - `dimension()` is the transformation's input dimension.
//! - `logdensity(x)`: check the length of `x`, transform it to `θ` with
//!   log absolute Jacobian determinant `J`, evaluate the parameter density
//!   at `θ` to get `v`, return `v + J`. When `v` is `-∞` it is returned
//!   as-is, whatever `J` is.
//! - A transformation that cannot map `x` fails with
//!   [`DensityError::TransformFailure`], which is distinct from a density
//!   value of `-∞`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Transformation and parameter density are held by `Arc` and never
//!   mutated; cloning a [`TransformedLogDensity`] shares both.
//! - Capability is `Order0`. The composed object implements
//!   [`DifferentiableLogDensity`], so an
//!   [`ADGradient`](crate::autodiff::gradient::ADGradient) differentiates
//!   through transformation and density together.
//!
//! [`DensityError::TransformFailure`]: crate::problems::errors::DensityError::TransformFailure
use std::{fmt, sync::Arc};

use crate::{
    autodiff::real::Real,
    problems::{
        errors::DensityResult,
        traits::{DifferentiableLogDensity, LogDensityProblem},
        validation::validate_dimension,
    },
};

/// Mapping from a fixed-length vector to a parameter value.
///
/// Implementations report the input length they accept and return the
/// parameter value together with `ln |det J|` at `x`. They may assume
/// `x.len() == input_dimension()`; callers check it first.
pub trait Transformation {
    type Output<S: Real>;

    fn input_dimension(&self) -> usize;
    fn transform_with_logjac<S: Real>(&self, x: &[S]) -> DensityResult<(Self::Output<S>, S)>;

    /// Parameter value without the log-Jacobian.
    fn transform<S: Real>(&self, x: &[S]) -> DensityResult<Self::Output<S>> {
        self.transform_with_logjac(x).map(|(params, _)| params)
    }
}

/// Log density over the parameter values produced by a transformation `T`.
pub trait ParameterLogDensity<T: Transformation + ?Sized> {
    fn logdensity_params<S: Real>(&self, params: &T::Output<S>) -> DensityResult<S>;
}

/// Density of `x` defined by `ℓ(t(x)) + ln |det J_t(x)|`.
pub struct TransformedLogDensity<T, F> {
    transformation: Arc<T>,
    log_density_function: Arc<F>,
}

impl<T, F> TransformedLogDensity<T, F>
where
    T: Transformation,
    F: ParameterLogDensity<T>,
{
    pub fn new(transformation: T, log_density_function: F) -> Self {
        TransformedLogDensity::from_shared(Arc::new(transformation), Arc::new(log_density_function))
    }

    /// Build from already shared parts.
    pub fn from_shared(transformation: Arc<T>, log_density_function: Arc<F>) -> Self {
        TransformedLogDensity { transformation, log_density_function }
    }

    pub fn transformation(&self) -> &T {
        &self.transformation
    }

    pub fn log_density_function(&self) -> &F {
        &self.log_density_function
    }

    fn evaluate<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        validate_dimension(self.transformation.input_dimension(), x)?;
        let (params, logjac) = self.transformation.transform_with_logjac(x)?;
        let v = self.log_density_function.logdensity_params(&params)?;
        if v.value() == f64::NEG_INFINITY { Ok(v) } else { Ok(v + logjac) }
    }
}

impl<T, F> Clone for TransformedLogDensity<T, F> {
    fn clone(&self) -> Self {
        TransformedLogDensity {
            transformation: Arc::clone(&self.transformation),
            log_density_function: Arc::clone(&self.log_density_function),
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for TransformedLogDensity<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformedLogDensity")
            .field("transformation", &self.transformation)
            .finish_non_exhaustive()
    }
}

impl<T, F> LogDensityProblem for TransformedLogDensity<T, F>
where
    T: Transformation,
    F: ParameterLogDensity<T>,
{
    fn dimension(&self) -> usize {
        self.transformation.input_dimension()
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        self.evaluate(x)
    }
}

impl<T, F> DifferentiableLogDensity for TransformedLogDensity<T, F>
where
    T: Transformation,
    F: ParameterLogDensity<T>,
{
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        self.evaluate(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        problems::{
            capability::LogDensityOrder,
            errors::DensityError,
            traits::{capabilities, dimension, logdensity, logdensity_and_gradient},
        },
        transforms::{Identity, ScalarTransform, VectorTransform},
    };
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Dimension, capability and accessors of the composed density.
    // - The `v + J` rule, including the `-∞` short circuit.
    // - Propagation of transformation failures.
    // -------------------------------------------------------------------------

    /// Standard normal kernel over a vector parameter.
    struct StdNormal;

    impl ParameterLogDensity<Identity> for StdNormal {
        fn logdensity_params<S: Real>(&self, params: &Vec<S>) -> DensityResult<S> {
            Ok(-S::sum_of(params.iter().map(|&p| p * p)) * 0.5)
        }
    }

    /// Exponential(1) kernel truncated to `y ≤ cap`.
    struct CappedExponential {
        cap: f64,
    }

    impl ParameterLogDensity<VectorTransform> for CappedExponential {
        fn logdensity_params<S: Real>(&self, params: &Vec<S>) -> DensityResult<S> {
            let y = params[0];
            if y.value() > self.cap {
                return Ok(S::from_f64(f64::NEG_INFINITY));
            }
            Ok(-y)
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that an identity transform leaves the density unchanged and
    // reports dimension and capability of the composition.
    //
    // Given
    // -----
    // - Identity of dimension 3 composed with a standard normal kernel.
    //
    // Expect
    // ------
    // - dimension 3, capability Order0.
    // - Value equals `-|x|²/2` (J = 0).
    // - Gradient requests fail with `UnsupportedCapability`.
    fn identity_transform_is_additive_with_zero_jacobian() {
        // Arrange
        let ell = TransformedLogDensity::new(Identity::new(3), StdNormal);
        let x = [1.0, 2.0, -2.0];

        // Act
        let value = logdensity(&ell, &x).unwrap();

        // Assert
        assert_eq!(dimension(&ell), 3);
        assert_eq!(capabilities(&ell), LogDensityOrder::Order0);
        assert_eq!(ell.transformation().input_dimension(), 3);
        assert_relative_eq!(value, -4.5);
        assert!(matches!(
            logdensity_and_gradient(&ell, &x),
            Err(DensityError::UnsupportedCapability { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Check the `v + J` rule for a positive transform and the `-∞` short
    // circuit.
    //
    // Given
    // -----
    // - y = exp(x) with density `-y` for y ≤ 10 and `-∞` above.
    //
    // Expect
    // ------
    // - At x = 0.5: value `-exp(0.5) + 0.5`.
    // - At x = 3 (y ≈ 20): value exactly `-∞`.
    fn positive_transform_adds_log_jacobian_and_keeps_neg_infinity() {
        let ell = TransformedLogDensity::new(
            VectorTransform::new(vec![ScalarTransform::Positive]),
            CappedExponential { cap: 10.0 },
        );

        assert_relative_eq!(logdensity(&ell, &[0.5]).unwrap(), -(0.5_f64.exp()) + 0.5);
        assert_eq!(logdensity(&ell, &[3.0]).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Ensure transformation failures and wrong lengths surface as errors.
    //
    // Given
    // -----
    // - y = exp(x) at x = 800 (overflow) and a length-2 input.
    //
    // Expect
    // ------
    // - `TransformFailure { index: 0, .. }` and `DimensionMismatch`.
    fn transform_failures_are_errors_not_neg_infinity() {
        let ell = TransformedLogDensity::new(
            VectorTransform::new(vec![ScalarTransform::Positive]),
            CappedExponential { cap: f64::INFINITY },
        );

        assert!(matches!(
            logdensity(&ell, &[800.0]),
            Err(DensityError::TransformFailure { index: 0, .. })
        ));
        assert_eq!(
            logdensity(&ell, &[0.0, 0.0]),
            Err(DensityError::DimensionMismatch { expected: 1, found: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Confirm clones share the underlying parts.
    //
    // Given
    // -----
    // - A composed density and its clone.
    //
    // Expect
    // ------
    // - Both point at the same parameter density.
    fn clones_share_transformation_and_density() {
        let ell = TransformedLogDensity::new(Identity::new(2), StdNormal);
        let copy = ell.clone();
        assert!(std::ptr::eq(ell.log_density_function(), copy.log_density_function()));
        assert_eq!(logdensity(&copy, &[0.0, 0.0]), logdensity(&ell, &[0.0, 0.0]));
    }
}
