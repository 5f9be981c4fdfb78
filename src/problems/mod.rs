//! problems — the log density contract.
//!
//! Purpose
//! -------
//! Define what a log density problem is: a fixed dimension, a value
//! `ℓ(x)`, optionally a gradient, and a capability tag telling generic
//! callers which of these they may request.
//!
//! Key behaviors
//! -------------
//! - [`traits::LogDensityProblem`] is the object-safe contract;
//!   [`traits::DifferentiableLogDensity`] adds generic-scalar evaluation.
//! - [`capability::LogDensityOrder`] classifies objects without evaluating
//!   them.
//! - [`transformed::TransformedLogDensity`] composes a transformation with a
//!   parameter density and adds the log-Jacobian.
//! - [`reject::RejectErrors`] turns infeasible-point errors into `-∞`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Dimensions never change after construction.
//! - `-∞` is a legitimate value meaning "infeasible"; `NaN` and `+∞` are
//!   propagated as returned.
//! - Evaluation never mutates a density.
//!
//! Conventions
//! -----------
//! - Every fallible operation returns [`errors::DensityResult`].
//! - Free functions in [`traits`] check the contract before delegating and
//!   are the preferred entry points for generic code.
pub mod capability;
pub mod errors;
pub mod reject;
pub mod traits;
pub mod transformed;
pub mod types;
pub mod validation;

pub use self::capability::LogDensityOrder;
pub use self::errors::{DensityError, DensityResult};
pub use self::traits::{DifferentiableLogDensity, LogDensityProblem};
pub use self::types::{Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_logdensity::problems::prelude::*;
//
// to import the density contract in a single line.

pub mod prelude {
    pub use super::capability::{DynLogDensity, LogDensityOrder, SharedLogDensity, probe_capabilities};
    pub use super::errors::{DensityError, DensityResult};
    pub use super::reject::RejectErrors;
    pub use super::traits::{
        DifferentiableLogDensity, FnLogDensity, LogDensityProblem, capabilities, dimension, logdensity,
        logdensity_and_gradient,
    };
    pub use super::transformed::{ParameterLogDensity, Transformation, TransformedLogDensity};
    pub use super::types::{Grad, Theta};
    pub use crate::autodiff::real::Real;
}
