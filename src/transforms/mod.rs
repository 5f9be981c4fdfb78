//! transforms — constraining transformations for `TransformedLogDensity`.
//!
//! Purpose
//! -------
//! Provide ready-made [`Transformation`](crate::problems::transformed::Transformation)
//! implementations that map unconstrained vectors onto common parameter
//! domains, with log-Jacobians computed in numerically stable form.
//!
//! Key behaviors
//! -------------
//! - [`Identity`] for densities already defined on `ℝⁿ`.
//! - [`ScalarTransform`] for positive, unit-interval and bounded scalars.
//! - [`VectorTransform`] to combine scalar transforms coordinate-wise.
//! - [`stability`] holds the guarded softplus/logistic helpers.
//!
//! Invariants & assumptions
//! ------------------------
//! - All transforms are generic over [`Real`](crate::autodiff::real::Real),
//!   so gradients flow through them under every engine.
//! - Failures carry the 0-based coordinate index.
pub mod scalar;
pub mod stability;
pub mod vector;

pub use self::scalar::ScalarTransform;
pub use self::vector::{Identity, VectorTransform};

pub mod prelude {
    pub use super::scalar::ScalarTransform;
    pub use super::stability::{safe_logistic, safe_softplus};
    pub use super::vector::{Identity, VectorTransform};
}
