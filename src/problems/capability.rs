//! Capability tags for log density problems.
//!
//! A density declares the highest derivative order it can supply through
//! [`LogDensityOrder`]. Orders are totally ordered, so an object of order `K`
//! services every request of order `≤ K`; generic callers compare tags with
//! [`LogDensityOrder::supports`] before issuing gradient requests.
//!
//! Implementing [`LogDensityProblem`] is what makes a type a density, so
//! "not a density" is usually a compile-time fact. For type-erased values
//! [`probe_capabilities`] recovers the capability of the shared handles
//! ([`DynLogDensity`], [`SharedLogDensity`]) and returns `None` for anything
//! else.
use std::{any::Any, fmt, sync::Arc};

use crate::problems::{
    errors::{DensityError, DensityResult},
    traits::LogDensityProblem,
};

/// Highest derivative order a density can evaluate.
///
/// Variants:
/// - `Order0`: log density value only.
/// - `Order1`: log density value and gradient.
///
/// Higher orders are reserved; [`LogDensityOrder::from_order`] rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogDensityOrder {
    Order0,
    Order1,
}

impl LogDensityOrder {
    /// Numeric derivative order of the tag.
    pub fn order(self) -> usize {
        match self {
            LogDensityOrder::Order0 => 0,
            LogDensityOrder::Order1 => 1,
        }
    }

    /// Build a tag from a numeric order.
    ///
    /// # Errors
    /// Returns [`DensityError::InvalidOrder`] for orders above one.
    pub fn from_order(order: usize) -> DensityResult<Self> {
        match order {
            0 => Ok(LogDensityOrder::Order0),
            1 => Ok(LogDensityOrder::Order1),
            _ => Err(DensityError::InvalidOrder { order }),
        }
    }

    /// Whether an object with this capability can service `required`.
    pub fn supports(self, required: LogDensityOrder) -> bool {
        self >= required
    }
}

impl fmt::Display for LogDensityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order {}", self.order())
    }
}

/// Owned, type-erased density handle.
pub type DynLogDensity = Box<dyn LogDensityProblem + Send + Sync>;

/// Shared, type-erased density handle.
pub type SharedLogDensity = Arc<dyn LogDensityProblem + Send + Sync>;

/// Capability of a type-erased value, or `None` when the value is not a
/// density handle.
///
/// Recognizes [`DynLogDensity`] and [`SharedLogDensity`]. The query never
/// evaluates the density.
pub fn probe_capabilities(value: &dyn Any) -> Option<LogDensityOrder> {
    if let Some(problem) = value.downcast_ref::<DynLogDensity>() {
        return Some(problem.capabilities());
    }
    if let Some(problem) = value.downcast_ref::<SharedLogDensity>() {
        return Some(problem.capabilities());
    }
    None
}
