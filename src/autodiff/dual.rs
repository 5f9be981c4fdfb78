//! autodiff::dual — chunked forward-mode dual numbers.
//!
//! A [`Dual`] carries a primal value and up to [`MAX_CHUNK`] partial
//! derivatives. The forward-mode backend seeds `chunk` input coordinates per
//! pass, so a gradient of dimension `n` takes `ceil(n / chunk)` passes.
//!
//! Invariants
//! ----------
//! - Partials at slots `>= width` are always zero.
//! - Binary operations produce `width = max(lhs.width, rhs.width)`;
//!   constants have width zero.
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::autodiff::real::Real;

/// Largest chunk size the forward-mode backend accepts.
pub const MAX_CHUNK: usize = 12;

/// Forward-mode dual number with a fixed-capacity partial vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    val: f64,
    partials: [f64; MAX_CHUNK],
    width: usize,
}

impl Dual {
    /// Dual with zero partials.
    pub fn constant(val: f64) -> Self {
        Dual { val, partials: [0.0; MAX_CHUNK], width: 0 }
    }

    /// Dual seeded with a unit partial at `slot` out of `width` slots.
    ///
    /// Returns `None` when `width > MAX_CHUNK` or `slot >= width`.
    pub fn seeded(val: f64, slot: usize, width: usize) -> Option<Self> {
        if width > MAX_CHUNK || slot >= width {
            return None;
        }
        let mut partials = [0.0; MAX_CHUNK];
        partials[slot] = 1.0;
        Some(Dual { val, partials, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Partial derivative at `slot`, zero outside the active width.
    pub fn partial(&self, slot: usize) -> f64 {
        if slot < self.width { self.partials[slot] } else { 0.0 }
    }

    // Apply f(val) with derivative f'(val) via the chain rule.
    fn chain(self, val: f64, deriv: f64) -> Self {
        let mut out = Dual { val, partials: [0.0; MAX_CHUNK], width: self.width };
        for i in 0..self.width {
            out.partials[i] = deriv * self.partials[i];
        }
        out
    }

    // Combine partials as `da * a + db * b` over the joint width.
    fn combine(a: Self, da: f64, b: Self, db: f64, val: f64) -> Self {
        let width = a.width.max(b.width);
        let mut out = Dual { val, partials: [0.0; MAX_CHUNK], width };
        for i in 0..width {
            out.partials[i] = da * a.partials[i] + db * b.partials[i];
        }
        out
    }
}

impl Add for Dual {
    type Output = Dual;
    fn add(self, rhs: Dual) -> Dual {
        Dual::combine(self, 1.0, rhs, 1.0, self.val + rhs.val)
    }
}

impl Sub for Dual {
    type Output = Dual;
    fn sub(self, rhs: Dual) -> Dual {
        Dual::combine(self, 1.0, rhs, -1.0, self.val - rhs.val)
    }
}

impl Mul for Dual {
    type Output = Dual;
    fn mul(self, rhs: Dual) -> Dual {
        Dual::combine(self, rhs.val, rhs, self.val, self.val * rhs.val)
    }
}

impl Div for Dual {
    type Output = Dual;
    fn div(self, rhs: Dual) -> Dual {
        let val = self.val / rhs.val;
        Dual::combine(self, 1.0 / rhs.val, rhs, -val / rhs.val, val)
    }
}

impl Neg for Dual {
    type Output = Dual;
    fn neg(self) -> Dual {
        self.chain(-self.val, -1.0)
    }
}

impl Add<f64> for Dual {
    type Output = Dual;
    fn add(self, rhs: f64) -> Dual {
        Dual { val: self.val + rhs, ..self }
    }
}

impl Sub<f64> for Dual {
    type Output = Dual;
    fn sub(self, rhs: f64) -> Dual {
        Dual { val: self.val - rhs, ..self }
    }
}

impl Mul<f64> for Dual {
    type Output = Dual;
    fn mul(self, rhs: f64) -> Dual {
        self.chain(self.val * rhs, rhs)
    }
}

impl Div<f64> for Dual {
    type Output = Dual;
    fn div(self, rhs: f64) -> Dual {
        self.chain(self.val / rhs, 1.0 / rhs)
    }
}

impl Real for Dual {
    fn from_f64(value: f64) -> Self {
        Dual::constant(value)
    }

    fn value(&self) -> f64 {
        self.val
    }

    fn ln(self) -> Self {
        self.chain(self.val.ln(), 1.0 / self.val)
    }

    fn exp(self) -> Self {
        let e = self.val.exp();
        self.chain(e, e)
    }

    fn ln_1p(self) -> Self {
        self.chain(self.val.ln_1p(), 1.0 / (1.0 + self.val))
    }

    fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn powi(self, n: i32) -> Self {
        let deriv = if n == 0 { 0.0 } else { f64::from(n) * self.val.powi(n - 1) };
        self.chain(self.val.powi(n), deriv)
    }

    fn powf(self, p: f64) -> Self {
        let deriv = if p == 0.0 { 0.0 } else { p * self.val.powf(p - 1.0) };
        self.chain(self.val.powf(p), deriv)
    }

    fn abs(self) -> Self {
        let sign = if self.val < 0.0 { -1.0 } else { 1.0 };
        self.chain(self.val.abs(), sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Verify product and quotient rules on seeded duals.
    //
    // Given
    // -----
    // - x = 3 seeded in slot 0, y = 2 seeded in slot 1, width 2.
    //
    // Expect
    // ------
    // - d(xy) = (y, x) = (2, 3).
    // - d(x/y) = (1/y, -x/y²) = (0.5, -0.75).
    fn product_and_quotient_rules() {
        // Arrange
        let x = Dual::seeded(3.0, 0, 2).unwrap();
        let y = Dual::seeded(2.0, 1, 2).unwrap();

        // Act
        let prod = x * y;
        let quot = x / y;

        // Assert
        assert_eq!(prod.value(), 6.0);
        assert_eq!((prod.partial(0), prod.partial(1)), (2.0, 3.0));
        assert_relative_eq!(quot.partial(0), 0.5);
        assert_relative_eq!(quot.partial(1), -0.75);
    }

    #[test]
    // Purpose
    // -------
    // Check elementary function derivatives and constant handling.
    //
    // Given
    // -----
    // - x = 0.5 seeded in a width-1 chunk.
    //
    // Expect
    // ------
    // - exp, ln, ln_1p, sqrt and powi match their analytic derivatives.
    // - Mixing with a constant keeps the width of the seeded operand.
    fn elementary_functions_follow_chain_rule() {
        let x = Dual::seeded(0.5, 0, 1).unwrap();

        assert_relative_eq!(x.exp().partial(0), 0.5_f64.exp());
        assert_relative_eq!(x.ln().partial(0), 2.0);
        assert_relative_eq!(x.ln_1p().partial(0), 1.0 / 1.5);
        assert_relative_eq!(x.sqrt().partial(0), 0.5 / 0.5_f64.sqrt());
        assert_relative_eq!(x.powi(3).partial(0), 3.0 * 0.25);

        let mixed = Dual::constant(4.0) * x + 1.0;
        assert_eq!(mixed.width(), 1);
        assert_relative_eq!(mixed.partial(0), 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid seeds are rejected instead of indexing out of bounds.
    //
    // Given
    // -----
    // - A slot equal to the width and a width above `MAX_CHUNK`.
    //
    // Expect
    // ------
    // - Both return `None`.
    fn seeded_rejects_out_of_range_slots() {
        assert!(Dual::seeded(0.0, 2, 2).is_none());
        assert!(Dual::seeded(0.0, 0, MAX_CHUNK + 1).is_none());
    }
}
