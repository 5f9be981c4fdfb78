//! autodiff::real — scalar abstraction for generic density evaluation.
//!
//! Purpose
//! -------
//! Let a density be written once and evaluated over plain `f64`, forward-mode
//! [`Dual`](crate::autodiff::dual::Dual) numbers, or reverse-mode
//! [`Var`](crate::autodiff::tape::Var) tape variables.
//!
//! Conventions
//! -----------
//! - Arithmetic between two scalars and between a scalar and an `f64`
//!   constant is available through the standard operator traits. Constants
//!   on the left-hand side are written as `-x + c` or `S::from_f64(c) - x`.
//! - `value()` returns the primal `f64` and never records anything.
use std::{
    fmt::Debug,
    ops::{Add, Div, Mul, Neg, Sub},
};

/// Scalar type a [`DifferentiableLogDensity`](crate::problems::traits::DifferentiableLogDensity)
/// can be evaluated over.
pub trait Real:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Lift a constant (zero derivative).
    fn from_f64(value: f64) -> Self;

    /// Primal value.
    fn value(&self) -> f64;

    fn ln(self) -> Self;
    fn exp(self) -> Self;
    fn ln_1p(self) -> Self;
    fn sqrt(self) -> Self;
    fn powi(self, n: i32) -> Self;
    fn powf(self, p: f64) -> Self;
    fn abs(self) -> Self;

    fn is_finite(&self) -> bool {
        self.value().is_finite()
    }

    /// Sum a sequence of scalars, starting from the constant zero.
    fn sum_of<I: IntoIterator<Item = Self>>(items: I) -> Self {
        items.into_iter().fold(Self::from_f64(0.0), |acc, v| acc + v)
    }
}

impl Real for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn value(&self) -> f64 {
        *self
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln_1p(self) -> Self {
        f64::ln_1p(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }

    fn powf(self, p: f64) -> Self {
        f64::powf(self, p)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }
}
