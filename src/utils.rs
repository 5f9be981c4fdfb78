//! utils — conversion helpers shared by the Python bindings.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! exists to keep `lib.rs` limited to class and module definitions.
#[cfg(feature = "python-bindings")]
use std::sync::Arc;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
use crate::{
    autodiff::backends::{ADOptions, FiniteDiffScheme},
    problems::{
        errors::{DensityError, DensityResult},
        traits::LogDensityProblem,
        validation::validate_dimension,
    },
};

/// Borrow a 1-D `float64` view of a numpy array, pandas Series, or sequence.
///
/// Contiguous numpy arrays are borrowed without copying; anything else is
/// copied into a fresh array.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray1<f64>>() {
        if arr.as_slice().is_ok() {
            return Ok(arr);
        }
    }

    if let Ok(obj) = raw.call_method("to_numpy", (false,), None) {
        if let Ok(series) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series.as_slice().is_ok() {
                return Ok(series);
            }
        }
    }

    let vec: Vec<f64> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Extract an evaluation point of length `dim`.
///
/// # Errors
/// - `TypeError` if `raw` is not 1-D float data.
/// - `ValueError` (from [`DensityError::DimensionMismatch`]) on a length
///   mismatch.
#[cfg(feature = "python-bindings")]
pub fn extract_point<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>, dim: usize) -> PyResult<Vec<f64>> {
    let arr = extract_f64_array(py, raw)?;
    let x = arr.as_slice().map_or_else(|_| arr.as_array().to_vec(), <[f64]>::to_vec);
    validate_dimension(dim, &x)?;
    Ok(x)
}

/// Build [`ADOptions`] from the keyword arguments accepted by the Python
/// `ADGradient` constructor.
#[cfg(feature = "python-bindings")]
pub fn build_ad_options(chunk: Option<usize>, fd_scheme: Option<&str>) -> PyResult<ADOptions> {
    let fd_scheme = fd_scheme.map(str::parse::<FiniteDiffScheme>).transpose()?;
    Ok(ADOptions::new(chunk, fd_scheme)?)
}

/// A log density backed by a Python callable `f(x: list[float]) -> float`.
///
/// Python exceptions raised by the callable, and return values that are not
/// floats, become [`DensityError::EvaluationFailure`].
#[cfg(feature = "python-bindings")]
#[derive(Debug, Clone)]
pub struct PyCallableDensity {
    callable: Arc<Py<PyAny>>,
    dim: usize,
}

#[cfg(feature = "python-bindings")]
impl PyCallableDensity {
    pub fn new(callable: Py<PyAny>, dim: usize) -> Self {
        PyCallableDensity { callable: Arc::new(callable), dim }
    }
}

#[cfg(feature = "python-bindings")]
impl LogDensityProblem for PyCallableDensity {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        validate_dimension(self.dim, x)?;
        Python::with_gil(|py| {
            let out = self
                .callable
                .call1(py, (x.to_vec(),))
                .map_err(|err| DensityError::evaluation(err.to_string()))?;
            out.extract::<f64>(py)
                .map_err(|_| DensityError::evaluation("log density callable must return a float"))
        })
    }
}
