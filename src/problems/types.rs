//! problems::types — shared numeric aliases.
//!
//! Centralize the vector types used across the crate so that densities,
//! differentiation backends and the stress harness agree on one
//! representation.
//!
//! Conventions
//! -----------
//! - Input points are passed as `&[f64]`; owned points (stress-test
//!   failures, benchmark locations) are stored as [`Theta`].
//! - Gradients are returned as [`Grad`] with length equal to the density's
//!   dimension.
use ndarray::Array1;

/// Owned point in the domain of a log density.
///
/// Alias for `ndarray::Array1<f64>`.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(x)`.
///
/// Alias for `ndarray::Array1<f64>`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;
