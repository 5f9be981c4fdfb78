//! Numerical stability utilities.
//!
//! Guarded versions of the softplus and logistic maps used by the
//! constraining transforms, generic over [`Real`] so they can be
//! differentiated. The cutoff `|x| > 20` keeps `f64` arithmetic in a
//! well-conditioned regime: beyond it `ln(1 + exp(x)) ≈ x` to working
//! precision.
use crate::autodiff::real::Real;

const SOFTPLUS_CUTOFF: f64 = 20.0;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For `x > 20`, returns `x`.
/// - Otherwise computes `ln1p(exp(x))`, which is accurate for large
///   negative `x` as well.
pub fn safe_softplus<S: Real>(x: S) -> S {
    if x.value() > SOFTPLUS_CUTOFF { x } else { x.exp().ln_1p() }
}

/// Logistic map `1 / (1 + exp(-x))`, evaluated on the branch that cannot
/// overflow.
pub fn safe_logistic<S: Real>(x: S) -> S {
    if x.value() >= 0.0 {
        S::from_f64(1.0) / ((-x).exp() + 1.0)
    } else {
        let e = x.exp();
        e / (e + 1.0)
    }
}

/// Log of the logistic map, `-softplus(-x)`.
pub fn log_logistic<S: Real>(x: S) -> S {
    -safe_softplus(-x)
}

/// Logit, the inverse of [`safe_logistic`] on `(0, 1)`.
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
