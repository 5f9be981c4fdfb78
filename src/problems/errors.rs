//! Errors for log density problems (contract violations, transformation and
//! differentiation failures, harness configuration).
//!
//! This module defines the crate-wide error type, [`DensityError`], and its
//! result alias [`DensityResult`]. Every fallible operation in the crate
//! returns `DensityResult<T>`; there is no second error surface.
//!
//! ## Conventions
//! - **Indices are 0-based**.
//! - Contract violations (`DimensionMismatch`, `UnsupportedCapability`) are
//!   detected before any numeric work.
//! - Construction-time errors (`UnknownBackend`, `InvalidBackendOption`,
//!   `InvalidChunkSize`, `InvalidBounds`, ...) are raised by constructors and
//!   never deferred to the first evaluation.
//! - Numeric degeneracy (`-inf`, `NaN`) is **not** an error; it is a valid
//!   log density value.
use crate::{autodiff::backends::ADBackend, problems::capability::LogDensityOrder};
use thiserror::Error;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Crate-wide result alias for log density operations.
pub type DensityResult<T> = Result<T, DensityError>;

/// Unified error type for log density problems.
///
/// Covers the evaluation contract, capability dispatch, differentiation
/// backends, transformations, and harness configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DensityError {
    // ---- Evaluation contract ----
    /// Input vector length disagrees with the declared dimension.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A first-order density returned a gradient of the wrong length.
    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    /// A derivative order was requested that the density does not support.
    #[error("Unsupported capability: {required} requested, density supports {available}")]
    UnsupportedCapability { required: LogDensityOrder, available: LogDensityOrder },

    /// Derivative orders above one are reserved.
    #[error("Invalid log density order {order}: only orders 0 and 1 are supported")]
    InvalidOrder { order: usize },

    // ---- Differentiation backends ----
    /// Backend identifier is not known to the registry in use.
    #[error("Unknown differentiation backend '{name}': {reason}")]
    UnknownBackend { name: String, reason: &'static str },

    /// An option was supplied that the selected backend does not accept.
    #[error("Invalid option '{option}' for backend {backend}: {reason}")]
    InvalidBackendOption { backend: ADBackend, option: &'static str, reason: &'static str },

    /// Forward-mode chunk size outside `1..=min(dimension, MAX_CHUNK)`.
    ///
    /// `dimension` is `None` when the chunk is rejected before a density is
    /// known (in [`ADOptions::new`](crate::autodiff::backends::ADOptions::new)).
    #[error("Invalid chunk size {chunk}{}: {reason}", for_dimension(.dimension))]
    InvalidChunkSize { chunk: usize, dimension: Option<usize>, reason: &'static str },

    /// The backend could not differentiate the wrapped evaluation.
    #[error("Differentiation failed in backend {backend}: {reason}")]
    DifferentiationFailure { backend: ADBackend, reason: String },

    // ---- Transformations ----
    /// The transformation rejected the input point.
    #[error("Transformation failed at index {index} (value {value}): {reason}")]
    TransformFailure { index: usize, value: f64, reason: &'static str },

    /// Bounded transform built with an empty or non-finite interval.
    #[error("Invalid bounds ({lower}, {upper}): {reason}")]
    InvalidBounds { lower: f64, upper: f64, reason: &'static str },

    // ---- User densities ----
    /// A user density reported a failure for the given point.
    #[error("Log density evaluation failed: {reason}")]
    EvaluationFailure { reason: String },

    /// A density panicked while being probed by the stress harness.
    #[error("Log density evaluation panicked: {message}")]
    EvaluationPanic { message: String },

    // ---- Harness configuration ----
    /// Stress-test scale must be finite and strictly positive.
    #[error("Invalid scale at index {index}: {value}: {reason}")]
    InvalidScale { index: usize, value: f64, reason: &'static str },

    /// Benchmark repetitions must be positive.
    #[error("Invalid repetitions {repetitions}: {reason}")]
    InvalidRepetitions { repetitions: usize, reason: &'static str },
}

impl DensityError {
    /// Build a [`DensityError::EvaluationFailure`] from any displayable reason.
    pub fn evaluation(reason: impl Into<String>) -> Self {
        DensityError::EvaluationFailure { reason: reason.into() }
    }

    /// Whether the error describes an infeasible point rather than a broken
    /// contract or a differentiation problem.
    ///
    /// Only these errors may be turned into `-inf` by
    /// [`RejectErrors`](crate::problems::reject::RejectErrors).
    pub fn is_rejectable(&self) -> bool {
        matches!(
            self,
            DensityError::TransformFailure { .. } | DensityError::EvaluationFailure { .. }
        )
    }
}

fn for_dimension(dimension: &Option<usize>) -> String {
    dimension.map(|d| format!(" for dimension {d}")).unwrap_or_default()
}

#[cfg(feature = "python-bindings")]
impl From<DensityError> for PyErr {
    fn from(err: DensityError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
