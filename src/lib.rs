//! rust_logdensity — log density problems, AD gradient wrappers and
//! diagnostics, with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes Python-callable log densities, gradient wrappers and the stress
//! test through the `_rust_logdensity` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`problems`, `transforms`, `autodiff`,
//!   `diagnostics`) as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_logdensity` Python extension when `python-bindings` is enabled.
//! - Create and register Python submodules (`problems`, `autodiff`,
//!   `diagnostics`) so that dotted imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion and error mapping.
//! - A Python density is a callable `f(x: list[float]) -> float`. It has no
//!   generic-scalar form, so only the `FiniteDiff` engine can differentiate
//!   it; forward and reverse wrappers construct but fail on every gradient
//!   call.
//!
//! Conventions
//! -----------
//! - Errors from core Rust code are `DensityError` values internally and are
//!   converted to `ValueError` at the PyO3 boundary.
//! - Python exceptions raised by a density callable surface as evaluation
//!   failures, which the stress test records instead of raising.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on the inner modules and ignore the PyO3
//!   items guarded by `python-bindings`.
//! - The Python packaging layer imports `_rust_logdensity` and may wrap its
//!   classes in user-facing Python APIs.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   integration test under `tests/`.
//! - The PyO3 layer is exercised from Python; it holds no logic of its own
//!   beyond argument conversion.

pub mod autodiff;
pub mod diagnostics;
pub mod problems;
pub mod transforms;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    autodiff::{gradient::ADGradient, registry::BackendRegistry},
    diagnostics::stress::{StressOptions, StressScale, stresstest_seeded},
    problems::{
        capability::LogDensityOrder,
        traits::{self, LogDensityProblem},
    },
    utils::{PyCallableDensity, build_ad_options, extract_point},
};

/// LogDensity — Python-facing log density backed by a Python callable.
///
/// Constructed from Python via `LogDensity(dimension, f)` where `f` maps a
/// list of `dimension` floats to a float. The object is value-only
/// (capability order 0).
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_logdensity.problems", unsendable)]
pub struct LogDensity {
    inner: PyCallableDensity,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl LogDensity {
    #[new]
    #[pyo3(text_signature = "(dimension, f, /)")]
    pub fn new<'py>(dimension: usize, f: &Bound<'py, PyAny>) -> PyResult<Self> {
        if !f.is_callable() {
            return Err(PyTypeError::new_err("f must be callable"));
        }
        Ok(LogDensity { inner: PyCallableDensity::new(f.clone().unbind(), dimension) })
    }

    #[getter]
    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    /// Capability order: 0 (value only).
    pub fn capabilities(&self) -> usize {
        self.inner.capabilities().order()
    }

    pub fn logdensity<'py>(&self, py: Python<'py>, x: &Bound<'py, PyAny>) -> PyResult<f64> {
        let x = extract_point(py, x, self.inner.dimension())?;
        Ok(traits::logdensity(&self.inner, &x)?)
    }
}

/// ADGradient — Python-facing gradient wrapper over a [`LogDensity`].
///
/// Constructed via `ADGradient(backend, density, chunk=None, fd_scheme=None)`.
/// `backend` is a registered engine name (case-insensitive); `chunk` applies
/// to forward mode and `fd_scheme` (`"central"` or `"forward"`) to finite
/// differences. Invalid names and options raise `ValueError` immediately.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "ADGradient", module = "rust_logdensity.autodiff", unsendable)]
pub struct PyADGradient {
    inner: ADGradient<PyCallableDensity>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyADGradient {
    #[new]
    #[pyo3(
        signature = (backend, density, chunk = None, fd_scheme = None),
        text_signature = "(backend, density, /, chunk=None, fd_scheme=None)"
    )]
    pub fn new(
        backend: &str, density: PyRef<'_, LogDensity>, chunk: Option<usize>, fd_scheme: Option<&str>,
    ) -> PyResult<Self> {
        let backend = BackendRegistry::global().lookup(backend)?;
        let options = build_ad_options(chunk, fd_scheme)?;
        let inner = ADGradient::value_only(backend, density.inner.clone(), options)?;
        Ok(PyADGradient { inner })
    }

    #[getter]
    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    #[getter]
    pub fn backend(&self) -> String {
        self.inner.backend().to_string()
    }

    #[getter]
    pub fn chunk(&self) -> Option<usize> {
        self.inner.chunk()
    }

    /// Capability order: 1 (value and gradient).
    pub fn capabilities(&self) -> usize {
        self.inner.capabilities().order()
    }

    pub fn logdensity<'py>(&self, py: Python<'py>, x: &Bound<'py, PyAny>) -> PyResult<f64> {
        let x = extract_point(py, x, self.inner.dimension())?;
        Ok(traits::logdensity(&self.inner, &x)?)
    }

    /// Return `(value, gradient)` with the gradient as a 1-D numpy array.
    pub fn logdensity_and_gradient<'py>(
        &self, py: Python<'py>, x: &Bound<'py, PyAny>,
    ) -> PyResult<(f64, Bound<'py, PyArray1<f64>>)> {
        let x = extract_point(py, x, self.inner.dimension())?;
        let (value, grad) = traits::logdensity_and_gradient(&self.inner, &x)?;
        Ok((value, grad.to_vec().into_pyarray(py)))
    }

    pub fn __repr__(&self) -> String {
        format!("<{}>", self.inner)
    }
}

/// Stress-test a `LogDensity` (values) or an `ADGradient` (values and
/// gradients) at `count` Cauchy(0, `scale`) draws seeded by `seed`.
///
/// Returns a list of `(x, error_message)` pairs, one per failed draw, in
/// draw order.
///
/// # Errors
/// - `TypeError` if `density` is neither a `LogDensity` nor an `ADGradient`.
/// - `ValueError` for a non-positive or non-finite `scale`.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "stresstest")]
#[pyo3(
    signature = (density, count = 1000, scale = 1.0, seed = 0),
    text_signature = "(density, /, count=1000, scale=1.0, seed=0)"
)]
pub fn py_stresstest<'py>(
    density: &Bound<'py, PyAny>, count: usize, scale: f64, seed: u64,
) -> PyResult<Vec<(Vec<f64>, String)>> {
    let options = StressOptions::new(count, StressScale::Scalar(scale))?;
    let failures = if let Ok(grad) = density.downcast::<PyADGradient>() {
        let grad = grad.borrow();
        stresstest_seeded(|p, x| traits::logdensity_and_gradient(p, x), &grad.inner, &options, seed)?
    } else if let Ok(ld) = density.downcast::<LogDensity>() {
        let ld = ld.borrow();
        stresstest_seeded(|p, x| traits::logdensity(p, x), &ld.inner, &options, seed)?
    } else {
        return Err(PyTypeError::new_err("density must be a LogDensity or an ADGradient"));
    };
    Ok(failures.into_iter().map(|f| (f.x.to_vec(), f.error.to_string())).collect())
}

/// Names of the registered differentiation engines, built-ins first.
#[cfg(feature = "python-bindings")]
#[pyfunction]
pub fn available_backends() -> Vec<String> {
    BackendRegistry::global().backends().iter().map(ToString::to_string).collect()
}

/// Parse a capability order (0 or 1) and return its display name.
#[cfg(feature = "python-bindings")]
#[pyfunction]
pub fn capability_name(order: usize) -> PyResult<String> {
    Ok(LogDensityOrder::from_order(order)?.to_string())
}

/// _rust_logdensity — Python extension module initializer.
///
/// Creates the `problems`, `autodiff` and `diagnostics` submodules, attaches
/// them to `_rust_logdensity`, and registers them in `sys.modules` under
/// `rust_logdensity.<name>` so dotted imports work.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating submodules or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_logdensity<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let problems_mod = PyModule::new(_py, "problems")?;
    let autodiff_mod = PyModule::new(_py, "autodiff")?;
    let diagnostics_mod = PyModule::new(_py, "diagnostics")?;
    problems(_py, m, &problems_mod)?;
    autodiff(_py, m, &autodiff_mod)?;
    diagnostics(_py, m, &diagnostics_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    let modules = _py.import("sys")?.getattr("modules")?;
    modules.set_item("rust_logdensity.problems", problems_mod)?;
    modules.set_item("rust_logdensity.autodiff", autodiff_mod)?;
    modules.set_item("rust_logdensity.diagnostics", diagnostics_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn problems<'py>(
    _py: Python, rust_logdensity: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<LogDensity>()?;
    m.add_function(wrap_pyfunction!(capability_name, m)?)?;
    rust_logdensity.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn autodiff<'py>(
    _py: Python, rust_logdensity: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PyADGradient>()?;
    m.add_function(wrap_pyfunction!(available_backends, m)?)?;
    rust_logdensity.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn diagnostics<'py>(
    _py: Python, rust_logdensity: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_stresstest, m)?)?;
    rust_logdensity.add_submodule(m)?;
    Ok(())
}
