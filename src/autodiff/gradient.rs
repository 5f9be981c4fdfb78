//! autodiff::gradient — the `ADGradient` wrapper.
//!
//! Purpose
//! -------
//! Turn a value-only density into a first-order one by pairing it with a
//! differentiation engine resolved from a [`BackendRegistry`].
//!
//! Key behaviors
//! -------------
//! - Construction resolves the backend and validates options immediately;
//!   [`DensityError::UnknownBackend`], [`DensityError::InvalidBackendOption`]
//!   and [`DensityError::InvalidChunkSize`] never surface later.
//! - `capabilities()` is always `Order1`; `dimension()` and `logdensity()`
//!   forward unchanged to the wrapped density.
//! - `logdensity_and_gradient()` checks the input length, then drives the
//!   engine over the wrapped evaluation. Errors from the wrapped density
//!   propagate unchanged.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`ADGradient::new`] requires [`DifferentiableLogDensity`], so every
//!   engine can evaluate the density. [`ADGradient::value_only`] accepts
//!   any density; dual and tape engines then fail per call with
//!   [`DensityError::DifferentiationFailure`], which leaves `FiniteDiff` as
//!   the useful choice.
//! - The wrapper is immutable and is `Send`/`Sync` when the density is.
use std::fmt;

use log::debug;

use crate::{
    autodiff::{
        backends::{ADBackend, ADOptions, GenericOperation, GradientStrategy, ValueOperation},
        real::Real,
        registry::BackendRegistry,
    },
    problems::{
        capability::LogDensityOrder,
        errors::DensityResult,
        traits::{DifferentiableLogDensity, LogDensityProblem},
        types::Grad,
        validation::validate_dimension,
    },
};

type Driver<P> = fn(&P, ADBackend, &dyn GradientStrategy, &[f64]) -> DensityResult<(f64, Grad)>;

/// First-order density built from a density and a differentiation engine.
pub struct ADGradient<P> {
    backend: ADBackend,
    options: ADOptions,
    problem: P,
    strategy: Box<dyn GradientStrategy>,
    driver: Driver<P>,
}

impl<P: DifferentiableLogDensity> ADGradient<P> {
    /// Wrap `problem` using an engine from the global registry.
    ///
    /// # Errors
    /// - [`DensityError::UnknownBackend`] for unregistered identifiers.
    /// - [`DensityError::InvalidBackendOption`] /
    ///   [`DensityError::InvalidChunkSize`] for options the engine rejects.
    ///
    /// [`DensityError::UnknownBackend`]: crate::problems::errors::DensityError::UnknownBackend
    /// [`DensityError::InvalidBackendOption`]: crate::problems::errors::DensityError::InvalidBackendOption
    /// [`DensityError::InvalidChunkSize`]: crate::problems::errors::DensityError::InvalidChunkSize
    pub fn new(backend: ADBackend, problem: P, options: ADOptions) -> DensityResult<Self> {
        ADGradient::with_registry(BackendRegistry::global(), backend, problem, options)
    }

    /// Wrap `problem` using an engine from `registry`.
    pub fn with_registry(
        registry: &BackendRegistry, backend: ADBackend, problem: P, options: ADOptions,
    ) -> DensityResult<Self> {
        ADGradient::build(registry, backend, problem, options, generic_driver::<P>)
    }

    /// Wrap `problem` using the global engine registered under `name`
    /// (case-insensitive).
    pub fn from_name(name: &str, problem: P, options: ADOptions) -> DensityResult<Self> {
        let backend = BackendRegistry::global().lookup(name)?;
        ADGradient::new(backend, problem, options)
    }
}

impl<P: LogDensityProblem> ADGradient<P> {
    /// Wrap a density that only evaluates over `f64`.
    pub fn value_only(backend: ADBackend, problem: P, options: ADOptions) -> DensityResult<Self> {
        ADGradient::build(BackendRegistry::global(), backend, problem, options, value_driver::<P>)
    }

    /// Like [`ADGradient::value_only`] with an explicit registry.
    pub fn value_only_with_registry(
        registry: &BackendRegistry, backend: ADBackend, problem: P, options: ADOptions,
    ) -> DensityResult<Self> {
        ADGradient::build(registry, backend, problem, options, value_driver::<P>)
    }

    fn build(
        registry: &BackendRegistry, backend: ADBackend, problem: P, options: ADOptions,
        driver: Driver<P>,
    ) -> DensityResult<Self> {
        let strategy = registry.resolve(backend, &options, problem.dimension())?;
        debug!(
            "ADGradient: backend {backend}, dimension {}, strategy {strategy:?}",
            problem.dimension()
        );
        Ok(ADGradient { backend, options, problem, strategy, driver })
    }

    /// The wrapped density.
    pub fn parent(&self) -> &P {
        &self.problem
    }

    pub fn into_parent(self) -> P {
        self.problem
    }

    pub fn backend(&self) -> ADBackend {
        self.backend
    }

    /// Options as supplied at construction.
    pub fn options(&self) -> &ADOptions {
        &self.options
    }

    /// Chunk size the engine runs with, for forward mode.
    pub fn chunk(&self) -> Option<usize> {
        self.strategy.chunk()
    }
}

fn generic_driver<P: DifferentiableLogDensity>(
    problem: &P, _backend: ADBackend, strategy: &dyn GradientStrategy, x: &[f64],
) -> DensityResult<(f64, Grad)> {
    strategy.value_and_gradient(&GenericOperation::new(problem), x)
}

fn value_driver<P: LogDensityProblem>(
    problem: &P, backend: ADBackend, strategy: &dyn GradientStrategy, x: &[f64],
) -> DensityResult<(f64, Grad)> {
    strategy.value_and_gradient(&ValueOperation::new(problem, backend), x)
}

impl<P: LogDensityProblem> LogDensityProblem for ADGradient<P> {
    fn dimension(&self) -> usize {
        self.problem.dimension()
    }

    fn capabilities(&self) -> LogDensityOrder {
        LogDensityOrder::Order1
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        self.problem.logdensity(x)
    }

    fn logdensity_and_gradient(&self, x: &[f64]) -> DensityResult<(f64, Grad)> {
        validate_dimension(self.problem.dimension(), x)?;
        (self.driver)(&self.problem, self.backend, self.strategy.as_ref(), x)
    }
}

impl<P: DifferentiableLogDensity> DifferentiableLogDensity for ADGradient<P> {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        self.problem.logdensity_real(x)
    }
}

impl<P> fmt::Debug for ADGradient<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ADGradient")
            .field("backend", &self.backend)
            .field("options", &self.options)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl<P> fmt::Display for ADGradient<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy.chunk() {
            Some(chunk) => write!(f, "{} AD wrapper (chunk size {chunk})", self.backend),
            None => write!(f, "{} AD wrapper", self.backend),
        }
    }
}
