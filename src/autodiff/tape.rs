//! autodiff::tape — reverse-mode tape of local partial derivatives.
//!
//! Evaluating a density over [`Var`] records every operation on a
//! [`Tape`] as a node holding up to two `(parent, ∂node/∂parent)` pairs.
//! [`Tape::gradient`] then runs one reverse adjoint sweep from the output
//! node, accumulating `adjoint[parent] += adjoint[node] * weight`.
//!
//! A tape is single-threaded and meant to live for one gradient call.
//! Constants are `Var`s without a tape; operations that only involve
//! constants record nothing.
use std::{
    cell::RefCell,
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

use ndarray::Array1;

use crate::{autodiff::real::Real, problems::types::Grad};

#[derive(Debug, Clone, Copy)]
struct TapeNode {
    parents: [(usize, f64); 2],
    arity: usize,
}

/// Append-only record of one evaluation.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<TapeNode>>,
}

impl Tape {
    pub fn new() -> Self {
        Tape::default()
    }

    /// Register an independent input variable.
    pub fn variable(&self, val: f64) -> Var<'_> {
        let index = self.push([(0, 0.0); 2], 0);
        Var { tape: Some(self), index, val }
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, parents: [(usize, f64); 2], arity: usize) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(TapeNode { parents, arity });
        nodes.len() - 1
    }

    /// Gradient of `output` with respect to `inputs`.
    ///
    /// Inputs that do not reach `output` (or were never recorded on this
    /// tape) get a zero partial. Nodes with a zero adjoint are skipped so
    /// that unused branches cannot inject `NaN` through infinite weights.
    pub fn gradient(&self, output: &Var<'_>, inputs: &[Var<'_>]) -> Grad {
        let nodes = self.nodes.borrow();
        let mut adjoints = vec![0.0_f64; nodes.len()];

        if output.tape.is_some() && output.index < nodes.len() {
            adjoints[output.index] = 1.0;
            for i in (0..=output.index).rev() {
                let adj = adjoints[i];
                if adj == 0.0 {
                    continue;
                }
                let node = nodes[i];
                for &(parent, weight) in &node.parents[..node.arity] {
                    adjoints[parent] += adj * weight;
                }
            }
        }

        Array1::from_iter(inputs.iter().map(|input| match input.tape {
            Some(_) if input.index < adjoints.len() => adjoints[input.index],
            _ => 0.0,
        }))
    }
}

/// Scalar recorded on a [`Tape`].
#[derive(Clone, Copy)]
pub struct Var<'t> {
    tape: Option<&'t Tape>,
    index: usize,
    val: f64,
}

impl fmt::Debug for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("val", &self.val)
            .field("index", &self.tape.map(|_| self.index))
            .finish()
    }
}

impl<'t> Var<'t> {
    /// Untracked constant.
    pub fn constant(val: f64) -> Self {
        Var { tape: None, index: 0, val }
    }

    fn unary(self, val: f64, deriv: f64) -> Self {
        match self.tape {
            Some(tape) => {
                let index = tape.push([(self.index, deriv), (0, 0.0)], 1);
                Var { tape: Some(tape), index, val }
            }
            None => Var::constant(val),
        }
    }

    fn binary(a: Self, da: f64, b: Self, db: f64, val: f64) -> Self {
        match (a.tape, b.tape) {
            (Some(tape), Some(_)) => {
                let index = tape.push([(a.index, da), (b.index, db)], 2);
                Var { tape: Some(tape), index, val }
            }
            (Some(_), None) => a.unary(val, da),
            (None, Some(_)) => b.unary(val, db),
            (None, None) => Var::constant(val),
        }
    }
}

impl<'t> Add for Var<'t> {
    type Output = Var<'t>;
    fn add(self, rhs: Var<'t>) -> Var<'t> {
        Var::binary(self, 1.0, rhs, 1.0, self.val + rhs.val)
    }
}

impl<'t> Sub for Var<'t> {
    type Output = Var<'t>;
    fn sub(self, rhs: Var<'t>) -> Var<'t> {
        Var::binary(self, 1.0, rhs, -1.0, self.val - rhs.val)
    }
}

impl<'t> Mul for Var<'t> {
    type Output = Var<'t>;
    fn mul(self, rhs: Var<'t>) -> Var<'t> {
        Var::binary(self, rhs.val, rhs, self.val, self.val * rhs.val)
    }
}

impl<'t> Div for Var<'t> {
    type Output = Var<'t>;
    fn div(self, rhs: Var<'t>) -> Var<'t> {
        let val = self.val / rhs.val;
        Var::binary(self, 1.0 / rhs.val, rhs, -val / rhs.val, val)
    }
}

impl<'t> Neg for Var<'t> {
    type Output = Var<'t>;
    fn neg(self) -> Var<'t> {
        self.unary(-self.val, -1.0)
    }
}

impl<'t> Add<f64> for Var<'t> {
    type Output = Var<'t>;
    fn add(self, rhs: f64) -> Var<'t> {
        self.unary(self.val + rhs, 1.0)
    }
}

impl<'t> Sub<f64> for Var<'t> {
    type Output = Var<'t>;
    fn sub(self, rhs: f64) -> Var<'t> {
        self.unary(self.val - rhs, 1.0)
    }
}

impl<'t> Mul<f64> for Var<'t> {
    type Output = Var<'t>;
    fn mul(self, rhs: f64) -> Var<'t> {
        self.unary(self.val * rhs, rhs)
    }
}

impl<'t> Div<f64> for Var<'t> {
    type Output = Var<'t>;
    fn div(self, rhs: f64) -> Var<'t> {
        self.unary(self.val / rhs, 1.0 / rhs)
    }
}

impl<'t> Real for Var<'t> {
    fn from_f64(value: f64) -> Self {
        Var::constant(value)
    }

    fn value(&self) -> f64 {
        self.val
    }

    fn ln(self) -> Self {
        self.unary(self.val.ln(), 1.0 / self.val)
    }

    fn exp(self) -> Self {
        let e = self.val.exp();
        self.unary(e, e)
    }

    fn ln_1p(self) -> Self {
        self.unary(self.val.ln_1p(), 1.0 / (1.0 + self.val))
    }

    fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        self.unary(s, 0.5 / s)
    }

    fn powi(self, n: i32) -> Self {
        let deriv = if n == 0 { 0.0 } else { f64::from(n) * self.val.powi(n - 1) };
        self.unary(self.val.powi(n), deriv)
    }

    fn powf(self, p: f64) -> Self {
        let deriv = if p == 0.0 { 0.0 } else { p * self.val.powf(p - 1.0) };
        self.unary(self.val.powf(p), deriv)
    }

    fn abs(self) -> Self {
        let sign = if self.val < 0.0 { -1.0 } else { 1.0 };
        self.unary(self.val.abs(), sign)
    }
}
