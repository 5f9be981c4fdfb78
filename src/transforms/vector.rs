//! transforms::vector — multi-coordinate transformations.
//!
//! - [`Identity`]: `θ = x`, `J = 0`; rejects non-finite coordinates.
//! - [`VectorTransform`]: one [`ScalarTransform`] per coordinate; `θ` is a
//!   `Vec` and `J` the sum of the coordinate log-Jacobians.
use ndarray::Array1;

use crate::{
    autodiff::real::Real,
    problems::{
        errors::{DensityError, DensityResult},
        transformed::Transformation,
        types::Theta,
        validation::validate_dimension,
    },
    transforms::scalar::ScalarTransform,
};

/// Identity transformation of a fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    dimension: usize,
}

impl Identity {
    pub fn new(dimension: usize) -> Self {
        Identity { dimension }
    }
}

impl Transformation for Identity {
    type Output<S: Real> = Vec<S>;

    fn input_dimension(&self) -> usize {
        self.dimension
    }

    fn transform_with_logjac<S: Real>(&self, x: &[S]) -> DensityResult<(Vec<S>, S)> {
        validate_dimension(self.dimension, x)?;
        if let Some((index, xi)) = x.iter().enumerate().find(|(_, xi)| !xi.is_finite()) {
            return Err(DensityError::TransformFailure {
                index,
                value: xi.value(),
                reason: "non-finite input",
            });
        }
        Ok((x.to_vec(), S::from_f64(0.0)))
    }
}

/// Coordinate-wise transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorTransform {
    coordinates: Vec<ScalarTransform>,
}

impl VectorTransform {
    pub fn new(coordinates: Vec<ScalarTransform>) -> Self {
        VectorTransform { coordinates }
    }

    /// Same transform for `dimension` coordinates.
    pub fn repeated(transform: ScalarTransform, dimension: usize) -> Self {
        VectorTransform { coordinates: vec![transform; dimension] }
    }

    pub fn coordinates(&self) -> &[ScalarTransform] {
        &self.coordinates
    }

    /// Unconstrained point mapping to `params`.
    ///
    /// # Errors
    /// - [`DensityError::DimensionMismatch`] for wrong lengths.
    /// - [`DensityError::TransformFailure`] at the first coordinate outside
    ///   its target set.
    pub fn inverse(&self, params: &[f64]) -> DensityResult<Theta> {
        validate_dimension(self.coordinates.len(), params)?;
        self.coordinates
            .iter()
            .zip(params)
            .enumerate()
            .map(|(index, (t, &y))| t.inverse(index, y))
            .collect::<DensityResult<Vec<f64>>>()
            .map(Array1::from)
    }
}

impl Transformation for VectorTransform {
    type Output<S: Real> = Vec<S>;

    fn input_dimension(&self) -> usize {
        self.coordinates.len()
    }

    fn transform_with_logjac<S: Real>(&self, x: &[S]) -> DensityResult<(Vec<S>, S)> {
        validate_dimension(self.coordinates.len(), x)?;
        let mut params = Vec::with_capacity(x.len());
        let mut logjac = S::from_f64(0.0);
        for (index, (t, &xi)) in self.coordinates.iter().zip(x).enumerate() {
            let (y, lj) = t.apply(index, xi)?;
            params.push(y);
            logjac = logjac + lj;
        }
        Ok((params, logjac))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Verify the identity transform copies its input with a zero Jacobian.
    //
    // Given
    // -----
    // - Identity(2) at (1.5, -0.5) and at (∞, 0).
    //
    // Expect
    // ------
    // - θ = x, J = 0.
    // - The infinite coordinate fails with `TransformFailure { index: 0 }`.
    fn identity_copies_input() {
        let t = Identity::new(2);
        let (theta, logjac) = t.transform_with_logjac(&[1.5, -0.5]).unwrap();
        assert_eq!(theta, vec![1.5, -0.5]);
        assert_eq!(logjac, 0.0);
        assert!(matches!(
            t.transform_with_logjac(&[f64::INFINITY, 0.0]),
            Err(DensityError::TransformFailure { index: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Check that coordinate log-Jacobians add up and failures carry the
    // failing index.
    //
    // Given
    // -----
    // - (Real, Positive, Bounded(0, 2)) at (0.4, 1.1, -0.3).
    //
    // Expect
    // ------
    // - J equals the sum of the scalar log-Jacobians.
    // - Overflow in coordinate 1 reports `index: 1`.
    // - `inverse` recovers x.
    fn vector_transform_sums_log_jacobians() {
        // Arrange
        let bounded = ScalarTransform::bounded(0.0, 2.0).unwrap();
        let t = VectorTransform::new(vec![ScalarTransform::Real, ScalarTransform::Positive, bounded]);
        let x = [0.4, 1.1, -0.3];

        // Act
        let (theta, logjac) = t.transform_with_logjac(&x).unwrap();

        // Assert
        let expected: f64 = t.coordinates().iter().zip(x).map(|(s, xi)| s.apply(0, xi).unwrap().1).sum();
        assert_relative_eq!(logjac, expected);
        let back = t.inverse(&theta).unwrap();
        for (b, xi) in back.iter().zip(x) {
            assert_relative_eq!(*b, xi, max_relative = 1e-10);
        }
        assert!(matches!(
            t.transform_with_logjac(&[0.0, 900.0, 0.0]),
            Err(DensityError::TransformFailure { index: 1, .. })
        ));
        assert_eq!(VectorTransform::repeated(ScalarTransform::Positive, 4).input_dimension(), 4);
    }
}
