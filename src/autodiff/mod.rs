//! autodiff — differentiation engines and the `ADGradient` wrapper.
//!
//! Purpose
//! -------
//! Give value-only log densities a gradient. A density is paired with an
//! engine (finite differences, chunked forward mode, or reverse mode)
//! selected by [`ADBackend`] and resolved through a [`BackendRegistry`].
//!
//! Key behaviors
//! -------------
//! - [`real::Real`] abstracts the scalar a density is evaluated over; it is
//!   implemented for `f64`, [`dual::Dual`] and [`tape::Var`].
//! - [`backends`] defines identifiers, options and the forward/reverse
//!   engines; [`finite_diff`] the finite-difference engine.
//! - [`registry`] maps identifiers to strategy factories.
//! - [`gradient::ADGradient`] is the first-order wrapper itself.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! use rust_logdensity::autodiff::prelude::*;
//! use rust_logdensity::problems::prelude::*;
//!
//! struct Quadratic;
//!
//! impl LogDensityProblem for Quadratic {
//!     fn dimension(&self) -> usize { 2 }
//!     fn logdensity(&self, x: &[f64]) -> DensityResult<f64> { self.logdensity_real(x) }
//! }
//!
//! impl DifferentiableLogDensity for Quadratic {
//!     fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
//!         Ok(-(x[0] * x[0] + x[1] * x[1]))
//!     }
//! }
//!
//! let grad = ADGradient::new(ADBackend::ReverseDiff, Quadratic, ADOptions::default()).unwrap();
//! let (value, g) = logdensity_and_gradient(&grad, &[1.0, -1.0]).unwrap();
//! assert_eq!(value, -2.0);
//! assert_eq!(g.to_vec(), vec![-2.0, 2.0]);
//! ```
pub mod backends;
pub mod dual;
pub mod finite_diff;
pub mod gradient;
pub mod real;
pub mod registry;
pub mod tape;

pub use self::backends::{ADBackend, ADOptions, FiniteDiffScheme, GradientStrategy};
pub use self::gradient::ADGradient;
pub use self::registry::BackendRegistry;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_logdensity::autodiff::prelude::*;
//
// to import the differentiation surface in a single line.

pub mod prelude {
    pub use super::backends::{ADBackend, ADOptions, EvaluateOperation, FiniteDiffScheme, GradientStrategy};
    pub use super::dual::{Dual, MAX_CHUNK};
    pub use super::gradient::ADGradient;
    pub use super::real::Real;
    pub use super::registry::{BackendRegistry, StrategyFactory};
    pub use super::tape::{Tape, Var};
}
