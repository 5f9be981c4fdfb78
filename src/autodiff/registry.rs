//! autodiff::registry — backend identifier → strategy factory table.
//!
//! The process-wide registry returned by [`BackendRegistry::global`] is built
//! once with the three built-in engines and is read-only afterwards. Callers
//! who need additional engines build their own registry
//! ([`BackendRegistry::with_defaults`] + [`BackendRegistry::register`]) and
//! pass it to [`ADGradient::with_registry`](crate::autodiff::gradient::ADGradient::with_registry).
use std::{collections::HashMap, sync::OnceLock};

use log::debug;

use crate::{
    autodiff::{
        backends::{ADBackend, ADOptions, ForwardDiffStrategy, GradientStrategy, ReverseDiffStrategy},
        finite_diff::FiniteDiffStrategy,
    },
    problems::errors::{DensityError, DensityResult},
};

/// Build a strategy from validated options and the density's dimension.
///
/// Factories reject options their engine does not use, so every
/// construction-time error surfaces before the first evaluation.
pub type StrategyFactory = fn(&ADOptions, usize) -> DensityResult<Box<dyn GradientStrategy>>;

/// Table of differentiation engines.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<ADBackend, StrategyFactory>,
}

impl BackendRegistry {
    /// Registry without any engine.
    pub fn empty() -> Self {
        BackendRegistry::default()
    }

    /// Registry with `FiniteDiff`, `ForwardDiff` and `ReverseDiff`.
    pub fn with_defaults() -> Self {
        let mut registry = BackendRegistry::empty();
        registry.register(ADBackend::FiniteDiff, finite_diff_factory);
        registry.register(ADBackend::ForwardDiff, forward_diff_factory);
        registry.register(ADBackend::ReverseDiff, reverse_diff_factory);
        registry
    }

    /// Process-wide registry of the built-in engines.
    pub fn global() -> &'static BackendRegistry {
        static GLOBAL: OnceLock<BackendRegistry> = OnceLock::new();
        GLOBAL.get_or_init(BackendRegistry::with_defaults)
    }

    /// Register (or replace) the factory for `backend`.
    pub fn register(&mut self, backend: ADBackend, factory: StrategyFactory) {
        debug!("registering differentiation backend {backend}");
        if self.factories.insert(backend, factory).is_some() {
            debug!("replaced previous factory for backend {backend}");
        }
    }

    pub fn contains(&self, backend: ADBackend) -> bool {
        self.factories.contains_key(&backend)
    }

    /// Registered identifiers, built-ins first, then custom names sorted.
    pub fn backends(&self) -> Vec<ADBackend> {
        let mut backends: Vec<ADBackend> = self.factories.keys().copied().collect();
        backends.sort_by_key(|b| match b {
            ADBackend::FiniteDiff => (0, ""),
            ADBackend::ForwardDiff => (1, ""),
            ADBackend::ReverseDiff => (2, ""),
            ADBackend::Custom(name) => (3, *name),
        });
        backends
    }

    /// Build the strategy for `backend`.
    ///
    /// # Errors
    /// - [`DensityError::UnknownBackend`] if `backend` is not registered.
    /// - Any option error raised by the backend's factory.
    pub fn resolve(
        &self, backend: ADBackend, options: &ADOptions, dim: usize,
    ) -> DensityResult<Box<dyn GradientStrategy>> {
        let factory = self.factories.get(&backend).ok_or_else(|| DensityError::UnknownBackend {
            name: backend.to_string(),
            reason: "Backend is not registered in this registry.",
        })?;
        factory(options, dim)
    }

    /// Find a registered backend by name (case-insensitive).
    ///
    /// # Errors
    /// Returns [`DensityError::UnknownBackend`] when no registered backend
    /// carries that name.
    pub fn lookup(&self, name: &str) -> DensityResult<ADBackend> {
        self.factories
            .keys()
            .copied()
            .find(|backend| backend.to_string().eq_ignore_ascii_case(name))
            .ok_or_else(|| DensityError::UnknownBackend {
                name: name.to_string(),
                reason: "No backend with this name is registered.",
            })
    }
}

fn finite_diff_factory(options: &ADOptions, dim: usize) -> DensityResult<Box<dyn GradientStrategy>> {
    Ok(Box::new(FiniteDiffStrategy::from_options(options, dim)?))
}

fn forward_diff_factory(options: &ADOptions, dim: usize) -> DensityResult<Box<dyn GradientStrategy>> {
    Ok(Box::new(ForwardDiffStrategy::from_options(options, dim)?))
}

fn reverse_diff_factory(options: &ADOptions, dim: usize) -> DensityResult<Box<dyn GradientStrategy>> {
    Ok(Box::new(ReverseDiffStrategy::from_options(options, dim)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        autodiff::{backends::EvaluateOperation, dual::Dual, gradient::ADGradient, real::Real},
        problems::{
            traits::{FnLogDensity, LogDensityProblem},
            types::Grad,
        },
    };
    use ndarray::Array1;

    #[derive(Debug)]
    struct ZeroGradient;

    impl GradientStrategy for ZeroGradient {
        fn value_and_gradient(
            &self, op: &dyn EvaluateOperation, x: &[f64],
        ) -> DensityResult<(f64, Grad)> {
            Ok((op.value(x)?, Array1::zeros(x.len())))
        }
    }

    fn zero_factory(_options: &ADOptions, _dim: usize) -> DensityResult<Box<dyn GradientStrategy>> {
        Ok(Box::new(ZeroGradient))
    }

    /// Custom engine that goes through the dual entry point.
    #[derive(Debug)]
    struct DualValue;

    impl GradientStrategy for DualValue {
        fn value_and_gradient(
            &self, op: &dyn EvaluateOperation, x: &[f64],
        ) -> DensityResult<(f64, Grad)> {
            let seeds: Vec<Dual> = x.iter().map(|&v| Dual::constant(v)).collect();
            let out = op.dual(&seeds)?;
            Ok((out.value(), Array1::zeros(x.len())))
        }
    }

    fn dual_value_factory(_options: &ADOptions, _dim: usize) -> DensityResult<Box<dyn GradientStrategy>> {
        Ok(Box::new(DualValue))
    }

    #[test]
    // Purpose
    // -------
    // Verify the global registry carries exactly the built-in engines.
    //
    // Given
    // -----
    // - `BackendRegistry::global()`.
    //
    // Expect
    // ------
    // - FiniteDiff, ForwardDiff, ReverseDiff in that order.
    // - A custom identifier is unknown.
    fn global_registry_has_builtin_engines() {
        let registry = BackendRegistry::global();
        assert_eq!(
            registry.backends(),
            vec![ADBackend::FiniteDiff, ADBackend::ForwardDiff, ADBackend::ReverseDiff]
        );
        let err = registry.resolve(ADBackend::Custom("zero"), &ADOptions::default(), 2).unwrap_err();
        assert!(matches!(err, DensityError::UnknownBackend { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Check that custom engines can be registered and looked up by name.
    //
    // Given
    // -----
    // - A registry with defaults plus `Custom("zero")`.
    //
    // Expect
    // ------
    // - `lookup("ZERO")` finds the custom backend; `resolve` builds it.
    // - `lookup("forwarddiff")` finds the built-in.
    // - Unregistered names fail with `UnknownBackend`.
    fn custom_backends_register_and_resolve() {
        // Arrange
        let mut registry = BackendRegistry::with_defaults();
        registry.register(ADBackend::Custom("zero"), zero_factory);

        // Act
        let backend = registry.lookup("ZERO").unwrap();
        let strategy = registry.resolve(backend, &ADOptions::default(), 3);

        // Assert
        assert_eq!(backend, ADBackend::Custom("zero"));
        assert!(strategy.is_ok());
        assert_eq!(registry.lookup("forwarddiff"), Ok(ADBackend::ForwardDiff));
        assert!(matches!(registry.lookup("Tracker"), Err(DensityError::UnknownBackend { .. })));
        assert!(BackendRegistry::empty().backends().is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Ensure a custom engine that needs generic evaluation reports itself
    // when wrapped around a value-only density.
    //
    // Given
    // -----
    // - `Custom("dualvalue")`, an engine that evaluates through `op.dual`.
    // - A closure density wrapped with `value_only_with_registry`.
    //
    // Expect
    // ------
    // - Construction succeeds and the value path still works.
    // - The gradient path fails with `DifferentiationFailure` naming
    //   `Custom("dualvalue")`, not a built-in engine.
    fn value_only_failures_name_the_custom_backend() {
        // Arrange
        let mut registry = BackendRegistry::with_defaults();
        registry.register(ADBackend::Custom("dualvalue"), dual_value_factory);
        let problem = FnLogDensity::new(1, |x: &[f64]| -> DensityResult<f64> { Ok(-x[0] * x[0]) });
        let grad = ADGradient::value_only_with_registry(
            &registry,
            ADBackend::Custom("dualvalue"),
            problem,
            ADOptions::default(),
        )
        .unwrap();

        // Act
        let value = grad.logdensity(&[2.0]);
        let result = grad.logdensity_and_gradient(&[2.0]);

        // Assert
        assert_eq!(value, Ok(-4.0));
        match result {
            Err(DensityError::DifferentiationFailure { backend, .. }) => {
                assert_eq!(backend, ADBackend::Custom("dualvalue"));
            }
            other => panic!("Expected DifferentiationFailure, got {other:?}"),
        }
    }
}
