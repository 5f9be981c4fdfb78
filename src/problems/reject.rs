//! problems::reject — treat infeasible-point errors as `-∞`.
//!
//! [`RejectErrors`] wraps a density and converts errors classified by
//! [`is_rejectable`] (transformation and user evaluation failures) into a
//! log density of `-∞`, with a zero gradient. Contract violations and
//! differentiation failures still propagate. The wrapper inherits the
//! capability of the wrapped density.
//!
//! [`is_rejectable`]: crate::problems::errors::DensityError::is_rejectable
use log::trace;
use ndarray::Array1;

use crate::{
    autodiff::real::Real,
    problems::{
        capability::LogDensityOrder,
        errors::DensityResult,
        traits::{DifferentiableLogDensity, LogDensityProblem},
        types::Grad,
    },
};

#[derive(Debug, Clone)]
pub struct RejectErrors<P> {
    problem: P,
}

impl<P: LogDensityProblem> RejectErrors<P> {
    pub fn new(problem: P) -> Self {
        RejectErrors { problem }
    }

    pub fn parent(&self) -> &P {
        &self.problem
    }

    pub fn into_parent(self) -> P {
        self.problem
    }
}

fn reject<T>(result: DensityResult<T>, rejected: impl FnOnce() -> T) -> DensityResult<T> {
    match result {
        Err(err) if err.is_rejectable() => {
            trace!("rejecting point: {err}");
            Ok(rejected())
        }
        other => other,
    }
}

impl<P: LogDensityProblem> LogDensityProblem for RejectErrors<P> {
    fn dimension(&self) -> usize {
        self.problem.dimension()
    }

    fn capabilities(&self) -> LogDensityOrder {
        self.problem.capabilities()
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        reject(self.problem.logdensity(x), || f64::NEG_INFINITY)
    }

    fn logdensity_and_gradient(&self, x: &[f64]) -> DensityResult<(f64, Grad)> {
        let dim = self.problem.dimension();
        reject(self.problem.logdensity_and_gradient(x), || (f64::NEG_INFINITY, Array1::zeros(dim)))
    }
}

impl<P: DifferentiableLogDensity> DifferentiableLogDensity for RejectErrors<P> {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        reject(self.problem.logdensity_real(x), || S::from_f64(f64::NEG_INFINITY))
    }
}
