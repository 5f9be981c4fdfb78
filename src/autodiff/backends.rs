//! autodiff::backends — backend identifiers, options and gradient engines.
//!
//! Purpose
//! -------
//! Name the differentiation engines, carry their options, and implement the
//! dual-number and tape engines behind one object-safe strategy interface.
//!
//! Key behaviors
//! -------------
//! - [`ADBackend`] identifies an engine and parses case-insensitively from a
//!   name, like the other option enums in this crate.
//! - [`ADOptions`] carries the optional `chunk` (forward mode) and
//!   `fd_scheme` (finite differences). Which options a backend accepts is
//!   checked by the backend's factory at wrapper construction.
//! - [`EvaluateOperation`] erases a density behind three entry points
//!   (`f64`, [`Dual`], [`Var`]) so strategies can be stored as trait objects.
//!   [`ValueOperation`] covers value-only densities; [`GenericOperation`]
//!   covers [`DifferentiableLogDensity`] implementors.
//! - [`ForwardDiffStrategy`] seeds `chunk` coordinates per pass;
//!   [`ReverseDiffStrategy`] records one tape per call.
//!
//! Invariants & assumptions
//! ------------------------
//! - Strategies are stateless. Every scratch buffer (dual seeds, tapes) is
//!   allocated per call, so one strategy can serve concurrent callers.
//! - Errors returned by the wrapped evaluation propagate unchanged.
//! - Input lengths are checked by the caller ([`ADGradient`]) before a
//!   strategy is invoked.
//!
//! [`ADGradient`]: crate::autodiff::gradient::ADGradient
use std::{fmt, str::FromStr};

use log::trace;
use ndarray::Array1;

use crate::{
    autodiff::{
        dual::{Dual, MAX_CHUNK},
        real::Real,
        tape::{Tape, Var},
    },
    problems::{
        errors::{DensityError, DensityResult},
        traits::{DifferentiableLogDensity, LogDensityProblem},
        types::Grad,
    },
};

/// Differentiation engine identifier.
///
/// Variants:
/// - `FiniteDiff`: central (or forward) finite differences on `f64`.
/// - `ForwardDiff`: chunked forward mode over [`Dual`] numbers.
/// - `ReverseDiff`: reverse mode over a [`Tape`].
/// - `Custom(name)`: engine registered by the caller in a custom
///   [`BackendRegistry`](crate::autodiff::registry::BackendRegistry).
///
/// Parsing:
/// `FromStr` accepts case-insensitive `"FiniteDiff"`, `"ForwardDiff"` and
/// `"ReverseDiff"`. Any other name returns [`DensityError::UnknownBackend`];
/// custom names are resolved through a registry instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ADBackend {
    FiniteDiff,
    ForwardDiff,
    ReverseDiff,
    Custom(&'static str),
}

impl fmt::Display for ADBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ADBackend::FiniteDiff => write!(f, "FiniteDiff"),
            ADBackend::ForwardDiff => write!(f, "ForwardDiff"),
            ADBackend::ReverseDiff => write!(f, "ReverseDiff"),
            ADBackend::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for ADBackend {
    type Err = DensityError;

    /// Parse a built-in backend name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finitediff" => Ok(ADBackend::FiniteDiff),
            "forwarddiff" => Ok(ADBackend::ForwardDiff),
            "reversediff" => Ok(ADBackend::ReverseDiff),
            _ => Err(DensityError::UnknownBackend {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'FiniteDiff', 'ForwardDiff' or 'ReverseDiff'.",
            }),
        }
    }
}

/// Finite-difference stencil.
///
/// `Central` is the default and falls back to `Forward` when a stencil point fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiniteDiffScheme {
    #[default]
    Central,
    Forward,
}

impl FromStr for FiniteDiffScheme {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "central" => Ok(FiniteDiffScheme::Central),
            "forward" => Ok(FiniteDiffScheme::Forward),
            _ => Err(DensityError::InvalidBackendOption {
                backend: ADBackend::FiniteDiff,
                option: "fd_scheme",
                reason: "Valid options are case insensitive 'Central' or 'Forward'.",
            }),
        }
    }
}

/// Backend options supplied at wrapper construction.
///
/// Fields:
/// - `chunk: Option<usize>`: forward-mode chunk size; `None` picks
///   `min(dimension, MAX_CHUNK)`.
/// - `fd_scheme: Option<FiniteDiffScheme>`: finite-difference stencil;
///   `None` picks `Central`.
///
/// Options affect performance only, never the gradient beyond floating-point
/// tolerance. Unset options are always accepted; a set option is rejected by
/// backends that do not use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ADOptions {
    pub chunk: Option<usize>,
    pub fd_scheme: Option<FiniteDiffScheme>,
}

impl ADOptions {
    /// Build options, checking what can be checked without a dimension.
    ///
    /// # Errors
    /// Returns [`DensityError::InvalidChunkSize`] (with `dimension: None`)
    /// when `chunk` is zero or above [`MAX_CHUNK`].
    pub fn new(chunk: Option<usize>, fd_scheme: Option<FiniteDiffScheme>) -> DensityResult<Self> {
        if let Some(chunk) = chunk {
            if chunk == 0 {
                return Err(DensityError::InvalidChunkSize {
                    chunk,
                    dimension: None,
                    reason: "Chunk size must be at least 1.",
                });
            }
            if chunk > MAX_CHUNK {
                return Err(DensityError::InvalidChunkSize {
                    chunk,
                    dimension: None,
                    reason: "Chunk size must not exceed MAX_CHUNK (12).",
                });
            }
        }
        Ok(ADOptions { chunk, fd_scheme })
    }

    /// Options selecting a forward-mode chunk size.
    pub fn with_chunk(chunk: usize) -> DensityResult<Self> {
        ADOptions::new(Some(chunk), None)
    }

    /// Options selecting a finite-difference stencil.
    pub fn with_fd_scheme(scheme: FiniteDiffScheme) -> Self {
        ADOptions { chunk: None, fd_scheme: Some(scheme) }
    }
}

// ---- Type-erased evaluation -----------------------------------------------

/// Object-safe view of one density evaluation at three scalar types.
pub trait EvaluateOperation {
    fn dimension(&self) -> usize;
    fn value(&self, x: &[f64]) -> DensityResult<f64>;
    fn dual(&self, x: &[Dual]) -> DensityResult<Dual>;
    fn tape<'t>(&self, x: &[Var<'t>]) -> DensityResult<Var<'t>>;
}

/// Evaluation of a value-only density. Dual and tape entry points fail with
/// [`DensityError::DifferentiationFailure`] naming `backend`, the engine the
/// caller is running.
#[derive(Debug)]
pub struct ValueOperation<'a, P: ?Sized> {
    problem: &'a P,
    backend: ADBackend,
}

impl<'a, P: LogDensityProblem + ?Sized> ValueOperation<'a, P> {
    pub fn new(problem: &'a P, backend: ADBackend) -> Self {
        ValueOperation { problem, backend }
    }

    fn no_generic_evaluation(&self) -> DensityError {
        DensityError::DifferentiationFailure {
            backend: self.backend,
            reason: "density only evaluates over f64; use the FiniteDiff backend".to_string(),
        }
    }
}

impl<P: LogDensityProblem + ?Sized> EvaluateOperation for ValueOperation<'_, P> {
    fn dimension(&self) -> usize {
        self.problem.dimension()
    }

    fn value(&self, x: &[f64]) -> DensityResult<f64> {
        self.problem.logdensity(x)
    }

    fn dual(&self, _x: &[Dual]) -> DensityResult<Dual> {
        Err(self.no_generic_evaluation())
    }

    fn tape<'t>(&self, _x: &[Var<'t>]) -> DensityResult<Var<'t>> {
        Err(self.no_generic_evaluation())
    }
}

/// Evaluation of a density generic over [`Real`](crate::autodiff::real::Real).
#[derive(Debug)]
pub struct GenericOperation<'a, P> {
    problem: &'a P,
}

impl<'a, P: DifferentiableLogDensity> GenericOperation<'a, P> {
    pub fn new(problem: &'a P) -> Self {
        GenericOperation { problem }
    }
}

impl<P: DifferentiableLogDensity> EvaluateOperation for GenericOperation<'_, P> {
    fn dimension(&self) -> usize {
        self.problem.dimension()
    }

    fn value(&self, x: &[f64]) -> DensityResult<f64> {
        self.problem.logdensity(x)
    }

    fn dual(&self, x: &[Dual]) -> DensityResult<Dual> {
        self.problem.logdensity_real(x)
    }

    fn tape<'t>(&self, x: &[Var<'t>]) -> DensityResult<Var<'t>> {
        self.problem.logdensity_real(x)
    }
}

// ---- Strategies -----------------------------------------------------------

/// Gradient engine stored inside an [`ADGradient`](crate::autodiff::gradient::ADGradient).
pub trait GradientStrategy: fmt::Debug + Send + Sync {
    /// Value and gradient of `op` at `x`.
    ///
    /// The returned value equals `op.value(x)`; the gradient is only
    /// meaningful when the value is finite.
    fn value_and_gradient(&self, op: &dyn EvaluateOperation, x: &[f64])
    -> DensityResult<(f64, Grad)>;

    /// Forward-mode chunk size, if the engine has one.
    fn chunk(&self) -> Option<usize> {
        None
    }
}

/// Chunked forward mode over [`Dual`] numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardDiffStrategy {
    chunk: usize,
}

impl ForwardDiffStrategy {
    /// Build the engine for a density of dimension `dim`.
    ///
    /// # Errors
    /// - [`DensityError::InvalidBackendOption`] if `fd_scheme` is set.
    /// - [`DensityError::InvalidChunkSize`] if `chunk` is zero, above
    ///   [`MAX_CHUNK`], or above `dim` (for `dim > 0`).
    pub fn from_options(options: &ADOptions, dim: usize) -> DensityResult<Self> {
        if options.fd_scheme.is_some() {
            return Err(DensityError::InvalidBackendOption {
                backend: ADBackend::ForwardDiff,
                option: "fd_scheme",
                reason: "ForwardDiff does not use a finite-difference scheme.",
            });
        }
        let chunk = match options.chunk {
            None => dim.clamp(1, MAX_CHUNK),
            Some(0) => {
                return Err(DensityError::InvalidChunkSize {
                    chunk: 0,
                    dimension: Some(dim),
                    reason: "Chunk size must be at least 1.",
                });
            }
            Some(chunk) if chunk > MAX_CHUNK => {
                return Err(DensityError::InvalidChunkSize {
                    chunk,
                    dimension: Some(dim),
                    reason: "Chunk size must not exceed MAX_CHUNK (12).",
                });
            }
            Some(chunk) if dim > 0 && chunk > dim => {
                return Err(DensityError::InvalidChunkSize {
                    chunk,
                    dimension: Some(dim),
                    reason: "Chunk size must not exceed the dimension.",
                });
            }
            Some(chunk) => chunk,
        };
        Ok(ForwardDiffStrategy { chunk })
    }
}

impl GradientStrategy for ForwardDiffStrategy {
    fn value_and_gradient(
        &self, op: &dyn EvaluateOperation, x: &[f64],
    ) -> DensityResult<(f64, Grad)> {
        let n = x.len();
        let mut seeds: Vec<Dual> = x.iter().map(|&v| Dual::constant(v)).collect();
        if n == 0 {
            let out = op.dual(&seeds)?;
            return Ok((out.value(), Array1::zeros(0)));
        }

        let mut grad = Array1::zeros(n);
        let mut value = f64::NAN;
        let passes = n.div_ceil(self.chunk);
        for pass in 0..passes {
            let start = pass * self.chunk;
            let end = (start + self.chunk).min(n);
            let width = end - start;
            for (slot, i) in (start..end).enumerate() {
                seeds[i] = Dual::seeded(x[i], slot, width).ok_or_else(|| {
                    DensityError::DifferentiationFailure {
                        backend: ADBackend::ForwardDiff,
                        reason: format!("cannot seed slot {slot} of a width-{width} chunk"),
                    }
                })?;
            }

            let out = op.dual(&seeds)?;
            value = out.value();
            for (slot, i) in (start..end).enumerate() {
                grad[i] = out.partial(slot);
                seeds[i] = Dual::constant(x[i]);
            }

            if !value.is_finite() {
                trace!("ForwardDiff: non-finite value {value} in pass {pass}, skipping remaining passes");
                return Ok((value, Array1::zeros(n)));
            }
        }
        trace!("ForwardDiff: dimension {n}, chunk {}, {passes} passes", self.chunk);
        Ok((value, grad))
    }

    fn chunk(&self) -> Option<usize> {
        Some(self.chunk)
    }
}

/// Reverse mode: one recorded forward sweep, one adjoint sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReverseDiffStrategy;

impl ReverseDiffStrategy {
    /// # Errors
    /// Returns [`DensityError::InvalidBackendOption`] if any option is set.
    pub fn from_options(options: &ADOptions, _dim: usize) -> DensityResult<Self> {
        if options.chunk.is_some() {
            return Err(DensityError::InvalidBackendOption {
                backend: ADBackend::ReverseDiff,
                option: "chunk",
                reason: "ReverseDiff does not use a chunk size.",
            });
        }
        if options.fd_scheme.is_some() {
            return Err(DensityError::InvalidBackendOption {
                backend: ADBackend::ReverseDiff,
                option: "fd_scheme",
                reason: "ReverseDiff does not use a finite-difference scheme.",
            });
        }
        Ok(ReverseDiffStrategy)
    }
}

impl GradientStrategy for ReverseDiffStrategy {
    fn value_and_gradient(
        &self, op: &dyn EvaluateOperation, x: &[f64],
    ) -> DensityResult<(f64, Grad)> {
        let tape = Tape::new();
        let inputs: Vec<Var<'_>> = x.iter().map(|&v| tape.variable(v)).collect();
        let out = op.tape(&inputs)?;
        let value = out.value();
        if !value.is_finite() {
            return Ok((value, Array1::zeros(x.len())));
        }
        let grad = tape.gradient(&out, &inputs);
        trace!("ReverseDiff: dimension {}, {} tape nodes", x.len(), tape.len());
        Ok((value, grad))
    }
}
