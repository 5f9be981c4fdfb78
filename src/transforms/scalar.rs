//! transforms::scalar — one-dimensional constraining transforms.
//!
//! Each [`ScalarTransform`] maps `x ∈ ℝ` to a constrained value `y` and
//! reports `ln |dy/dx|`:
//!
//! | variant                | y                              | ln \|dy/dx\|                         |
//! |------------------------|--------------------------------|--------------------------------------|
//! | `Real`                 | `x`                            | `0`                                  |
//! | `Positive`             | `exp(x)`                       | `x`                                  |
//! | `UnitInterval`         | `logistic(x)`                  | `-softplus(x) - softplus(-x)`        |
//! | `Bounded { l, u }`     | `l + (u - l)·logistic(x)`      | `ln(u - l) - softplus(x) - softplus(-x)` |
//!
//! A non-finite input, an overflowing output or a non-finite log-Jacobian
//! fails with [`DensityError::TransformFailure`] at the coordinate's index.
//! Far in the tails `y` can round onto the boundary of the target set in
//! `f64` (`logistic(40) == 1.0`, `exp(-800) == 0.0`) while `ln |dy/dx|` stays
//! finite; such a `y` is returned as is and the density decides what the
//! boundary is worth.
use crate::{
    autodiff::real::Real,
    problems::{
        errors::{DensityError, DensityResult},
        transformed::Transformation,
        validation::validate_dimension,
    },
    transforms::stability::{log_logistic, logit, safe_logistic},
};

/// Constraining transform for a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarTransform {
    Real,
    Positive,
    UnitInterval,
    Bounded { lower: f64, upper: f64 },
}

impl ScalarTransform {
    /// Bounded transform onto `(lower, upper)`.
    ///
    /// # Errors
    /// Returns [`DensityError::InvalidBounds`] unless both bounds are finite
    /// and `lower < upper`.
    pub fn bounded(lower: f64, upper: f64) -> DensityResult<Self> {
        validate_bounds(lower, upper)?;
        Ok(ScalarTransform::Bounded { lower, upper })
    }

    /// Map `x` (coordinate `index`) to `(y, ln |dy/dx|)`.
    pub fn apply<S: Real>(&self, index: usize, x: S) -> DensityResult<(S, S)> {
        let xv = x.value();
        if !xv.is_finite() {
            return Err(DensityError::TransformFailure { index, value: xv, reason: "non-finite input" });
        }
        let (y, logjac) = match *self {
            ScalarTransform::Real => (x, S::from_f64(0.0)),
            ScalarTransform::Positive => {
                let y = x.exp();
                if !y.is_finite() {
                    return Err(DensityError::TransformFailure { index, value: xv, reason: "exp overflow" });
                }
                (y, x)
            }
            ScalarTransform::UnitInterval => (safe_logistic(x), logistic_logjac(x)),
            ScalarTransform::Bounded { lower, upper } => {
                validate_bounds(lower, upper)?;
                let width = upper - lower;
                (safe_logistic(x) * width + lower, logistic_logjac(x) + width.ln())
            }
        };
        if !logjac.is_finite() {
            return Err(DensityError::TransformFailure { index, value: xv, reason: "non-finite log-Jacobian" });
        }
        Ok((y, logjac))
    }

    /// Unconstrained coordinate mapping to `y`.
    ///
    /// # Errors
    /// Returns [`DensityError::TransformFailure`] if `y` lies outside the
    /// open target set.
    pub fn inverse(&self, index: usize, y: f64) -> DensityResult<f64> {
        let outside = |reason| Err(DensityError::TransformFailure { index, value: y, reason });
        if !y.is_finite() {
            return outside("non-finite value");
        }
        match *self {
            ScalarTransform::Real => Ok(y),
            ScalarTransform::Positive if y > 0.0 => Ok(y.ln()),
            ScalarTransform::Positive => outside("value must be positive"),
            ScalarTransform::UnitInterval if y > 0.0 && y < 1.0 => Ok(logit(y)),
            ScalarTransform::UnitInterval => outside("value must lie in (0, 1)"),
            ScalarTransform::Bounded { lower, upper } => {
                validate_bounds(lower, upper)?;
                if y > lower && y < upper {
                    Ok(logit((y - lower) / (upper - lower)))
                } else {
                    outside("value must lie in (lower, upper)")
                }
            }
        }
    }
}

impl Transformation for ScalarTransform {
    type Output<S: Real> = S;

    fn input_dimension(&self) -> usize {
        1
    }

    fn transform_with_logjac<S: Real>(&self, x: &[S]) -> DensityResult<(S, S)> {
        validate_dimension(1, x)?;
        self.apply(0, x[0])
    }
}

// ln σ'(x) = ln σ(x) + ln σ(-x)
fn logistic_logjac<S: Real>(x: S) -> S {
    log_logistic(x) + log_logistic(-x)
}

fn validate_bounds(lower: f64, upper: f64) -> DensityResult<()> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(DensityError::InvalidBounds { lower, upper, reason: "bounds must be finite" });
    }
    if lower >= upper {
        return Err(DensityError::InvalidBounds { lower, upper, reason: "lower bound must be below upper bound" });
    }
    Ok(())
}
