//! Integration tests for the log density pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from a user density, through constraining
//!   transformations and AD gradient wrappers, to the stress test and chunk
//!   benchmark.
//! - Exercise the public crate surface only (`problems`, `transforms`,
//!   `autodiff`, `diagnostics`), the way a sampler would.
//!
//! Coverage
//! --------
//! - `problems`:
//!   - Contract checks (`DimensionMismatch`, `UnsupportedCapability`).
//!   - `TransformedLogDensity` log-Jacobian additivity.
//!   - `RejectErrors` on infeasible points.
//! - `autodiff`:
//!   - The bivariate normal scenario under every built-in engine.
//!   - Agreement between engines and chunk sizes through a transformation.
//!   - Construction-time failures for unknown engines.
//!   - Wrappers shared across threads reproduce single-threaded results.
//! - `diagnostics`:
//!   - Stress test failure recording and seeded reproducibility.
//!   - Chunk benchmark ordering.
//!
//! Exclusions
//! ----------
//! - Numerical details of the individual engines and transforms; those are
//!   covered by unit tests.
//! - Python bindings.
use approx::assert_relative_eq;
use ndarray::array;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_logdensity::{
    autodiff::prelude::*,
    diagnostics::prelude::*,
    problems::prelude::*,
    transforms::{Identity, ScalarTransform, VectorTransform},
};

/// Negative sum of squares (standard bivariate normal up to a constant).
#[derive(Debug, Clone, Copy)]
struct NegSumSquares {
    dim: usize,
}

impl LogDensityProblem for NegSumSquares {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn logdensity(&self, x: &[f64]) -> DensityResult<f64> {
        self.logdensity_real(x)
    }
}

impl DifferentiableLogDensity for NegSumSquares {
    fn logdensity_real<S: Real>(&self, x: &[S]) -> DensityResult<S> {
        Ok(-S::sum_of(x.iter().map(|&v| v * v)))
    }
}

impl ParameterLogDensity<Identity> for NegSumSquares {
    fn logdensity_params<S: Real>(&self, params: &Vec<S>) -> DensityResult<S> {
        self.logdensity_real(params)
    }
}

/// Density over (σ, p, m) with σ > 0, p ∈ (0, 1), m ∈ (-1, 3).
struct ScaleProbMean;

impl ParameterLogDensity<VectorTransform> for ScaleProbMean {
    fn logdensity_params<S: Real>(&self, params: &Vec<S>) -> DensityResult<S> {
        let (sigma, p, m) = (params[0], params[1], params[2]);
        Ok(-sigma.ln() - (m * m) / (sigma * sigma * 2.0) + p.ln() * 2.0 + (-p).ln_1p())
    }
}

/// Element-wise relative comparison of a gradient against expected values.
fn assert_grad_close(actual: &Grad, expected: &[f64], max_relative: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-8, max_relative = max_relative);
    }
}

fn constrained_problem() -> TransformedLogDensity<VectorTransform, ScaleProbMean> {
    let coordinates = vec![
        ScalarTransform::Positive,
        ScalarTransform::UnitInterval,
        ScalarTransform::bounded(-1.0, 3.0).unwrap(),
    ];
    TransformedLogDensity::new(VectorTransform::new(coordinates), ScaleProbMean)
}

#[test]
// Purpose
// -------
// Run the bivariate normal scenario under every built-in engine.
//
// Given
// -----
// - `ℓ(x) = -(x₁² + x₂²)` wrapped by FiniteDiff, ForwardDiff and ReverseDiff.
//
// Expect
// ------
// - Gradient `[0, 0]` and a finite value at `[0, 0]`.
// - Gradient `[-2, 2]` at `[1, -1]`.
// - Values equal the wrapped density's values.
fn bivariate_normal_gradients_under_every_engine() {
    for backend in [ADBackend::FiniteDiff, ADBackend::ForwardDiff, ADBackend::ReverseDiff] {
        // Arrange
        let problem = NegSumSquares { dim: 2 };
        let grad = ADGradient::new(backend, problem, ADOptions::default()).unwrap();

        // Act
        let (v0, g0) = logdensity_and_gradient(&grad, &[0.0, 0.0]).unwrap();
        let (v1, g1) = logdensity_and_gradient(&grad, &[1.0, -1.0]).unwrap();

        // Assert
        assert_eq!(capabilities(&grad), LogDensityOrder::Order1);
        assert!(v0.is_finite());
        assert_grad_close(&g0, &[0.0, 0.0], 1e-6);
        assert_relative_eq!(v1, -2.0, epsilon = 1e-12);
        assert_grad_close(&g1, &[-2.0, 2.0], 1e-6);
        assert_eq!(logdensity(&grad, &[1.0, -1.0]), logdensity(&problem, &[1.0, -1.0]));
    }
}

#[test]
// Purpose
// -------
// Check the contract errors raised before any evaluation.
//
// Given
// -----
// - A value-only closure density of dimension 2 and its AD wrapper.
//
// Expect
// ------
// - `DimensionMismatch` for a length-3 input on both.
// - `UnsupportedCapability` for a gradient request on the closure.
fn contract_errors_are_raised_before_evaluation() {
    let plain = FnLogDensity::new(2, |x: &[f64]| -> DensityResult<f64> { Ok(-(x[0] * x[0] + x[1] * x[1])) });
    let wrapped = ADGradient::new(ADBackend::ForwardDiff, NegSumSquares { dim: 2 }, ADOptions::default()).unwrap();

    assert_eq!(
        logdensity(&plain, &[0.0, 0.0, 0.0]),
        Err(DensityError::DimensionMismatch { expected: 2, found: 3 })
    );
    assert_eq!(
        logdensity_and_gradient(&wrapped, &[0.0, 0.0, 0.0]),
        Err(DensityError::DimensionMismatch { expected: 2, found: 3 })
    );
    assert_eq!(
        logdensity_and_gradient(&plain, &[0.0, 0.0]),
        Err(DensityError::UnsupportedCapability {
            required: LogDensityOrder::Order1,
            available: LogDensityOrder::Order0,
        })
    );
}

#[test]
// Purpose
// -------
// Verify log-Jacobian additivity for the identity and a positive transform.
//
// Given
// -----
// - `NegSumSquares` behind `Identity`.
// - `ScaleProbMean` behind positive/unit/bounded transforms.
//
// Expect
// ------
// - Identity composition reproduces the density value exactly.
// - The constrained composition equals `ℓ(t(x)) + Σ ln |dtᵢ/dxᵢ|`.
fn transformed_density_adds_log_jacobian() {
    // Arrange
    let base = NegSumSquares { dim: 2 };
    let identity = TransformedLogDensity::new(Identity::new(2), base);
    let constrained = constrained_problem();
    let x = [0.4, -0.3, 0.8];

    // Act
    let v_identity = logdensity(&identity, &[0.5, -1.5]).unwrap();
    let v_constrained = logdensity(&constrained, &x).unwrap();

    // Assert
    assert_eq!(v_identity, logdensity(&base, &[0.5, -1.5]).unwrap());

    let sigma = f64::exp(x[0]);
    let p = 1.0 / (1.0 + f64::exp(-x[1]));
    let q = 1.0 / (1.0 + f64::exp(-x[2]));
    let m = -1.0 + 4.0 * q;
    let ell = -sigma.ln() - m * m / (2.0 * sigma * sigma) + 2.0 * p.ln() + (1.0 - p).ln();
    let logjac = x[0] + (p * (1.0 - p)).ln() + (4.0 * q * (1.0 - q)).ln();
    assert_relative_eq!(v_constrained, ell + logjac, max_relative = 1e-12);
}

#[test]
// Purpose
// -------
// Ensure engines and chunk sizes agree through a transformed density.
//
// Given
// -----
// - The 3-dimensional constrained problem at a fixed point.
// - ForwardDiff with chunk 1, 2 and 3, ReverseDiff, and FiniteDiff (central
//   and forward).
//
// Expect
// ------
// - Exact-derivative engines agree to 1e-10 relative.
// - Finite differences agree to 1e-5 relative (forward scheme to 1e-4).
fn engines_agree_through_transformation() {
    // Arrange
    let problem = constrained_problem();
    let x = [0.3, -0.7, 1.2];
    let reverse = ADGradient::new(ADBackend::ReverseDiff, problem.clone(), ADOptions::default()).unwrap();
    let (v_ref, g_ref) = logdensity_and_gradient(&reverse, &x).unwrap();

    // Act / Assert
    for chunk in 1..=3 {
        let forward =
            ADGradient::new(ADBackend::ForwardDiff, problem.clone(), ADOptions::with_chunk(chunk).unwrap()).unwrap();
        let (v, g) = logdensity_and_gradient(&forward, &x).unwrap();
        assert_eq!(forward.chunk(), Some(chunk));
        assert_relative_eq!(v, v_ref, max_relative = 1e-12);
        assert_grad_close(&g, g_ref.as_slice().unwrap(), 1e-10);
    }

    let central = ADGradient::new(ADBackend::FiniteDiff, problem.clone(), ADOptions::default()).unwrap();
    let (_, g_central) = logdensity_and_gradient(&central, &x).unwrap();
    assert_grad_close(&g_central, g_ref.as_slice().unwrap(), 1e-5);

    let options = ADOptions::with_fd_scheme(FiniteDiffScheme::Forward);
    let forward_fd = ADGradient::new(ADBackend::FiniteDiff, problem, options).unwrap();
    let (_, g_forward_fd) = logdensity_and_gradient(&forward_fd, &x).unwrap();
    assert_grad_close(&g_forward_fd, g_ref.as_slice().unwrap(), 1e-4);
}

#[test]
// Purpose
// -------
// Check construction-time failures.
//
// Given
// -----
// - An unregistered engine name, a chunk above the dimension, and a
//   finite-difference scheme handed to forward mode.
//
// Expect
// ------
// - `UnknownBackend`, `InvalidChunkSize` and `InvalidBackendOption`.
// - Engine names resolve case-insensitively.
fn construction_fails_fast() {
    let problem = NegSumSquares { dim: 2 };

    assert!(matches!(
        ADGradient::from_name("Enzyme", problem, ADOptions::default()),
        Err(DensityError::UnknownBackend { .. })
    ));
    assert!(matches!(
        ADGradient::new(ADBackend::ForwardDiff, problem, ADOptions::with_chunk(3).unwrap()),
        Err(DensityError::InvalidChunkSize { .. })
    ));
    assert!(matches!(
        ADGradient::new(ADBackend::ForwardDiff, problem, ADOptions::with_fd_scheme(FiniteDiffScheme::Central)),
        Err(DensityError::InvalidBackendOption { .. })
    ));

    let by_name = ADGradient::from_name("forwarddiff", problem, ADOptions::default()).unwrap();
    assert_eq!(by_name.backend(), ADBackend::ForwardDiff);
}

#[test]
// Purpose
// -------
// Verify that `RejectErrors` turns infeasible transformed points into `-∞`
// inside a gradient wrapper, so samplers can reject them.
//
// Given
// -----
// - The constrained problem at a point where `exp` overflows.
//
// Expect
// ------
// - The bare wrapper raises `TransformFailure` at index 0.
// - The rejecting wrapper returns `(-∞, 0)`.
fn rejected_points_become_neg_infinity() {
    let x = [800.0, 0.0, 0.0];
    let bare = ADGradient::new(ADBackend::ForwardDiff, constrained_problem(), ADOptions::default()).unwrap();
    assert!(matches!(
        logdensity_and_gradient(&bare, &x),
        Err(DensityError::TransformFailure { index: 0, .. })
    ));

    let rejecting = RejectErrors::new(bare);
    let (value, grad) = logdensity_and_gradient(&rejecting, &x).unwrap();
    assert_eq!(value, f64::NEG_INFINITY);
    assert_eq!(grad, array![0.0, 0.0, 0.0]);
}

#[test]
// Purpose
// -------
// Run the stress test against a density that fails above a threshold.
//
// Given
// -----
// - A 2-dimensional density raising whenever `x₁ > 1e10`.
// - 1000 draws at scale 1e12, where about half the draws exceed the
//   threshold.
//
// Expect
// ------
// - At least one failure; every failure has `x₁ > 1e10` and an
//   `EvaluationFailure` reason.
// - The same seed reproduces the same failures through both entry points.
fn stresstest_records_threshold_failures() {
    // Arrange
    let problem = FnLogDensity::new(2, |x: &[f64]| {
        if x[0] > 1e10 {
            Err(DensityError::evaluation("first coordinate above 1e10"))
        } else {
            Ok(-(x[0] * x[0] + x[1] * x[1]))
        }
    });
    let options = StressOptions::new(1000, StressScale::Scalar(1e12)).unwrap();

    // Act
    let seeded = stresstest_seeded(|p, x| logdensity(p, x), &problem, &options, 2024).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let explicit = stresstest(|p, x| logdensity(p, x), &problem, &options, &mut rng).unwrap();

    // Assert
    assert!(!seeded.is_empty());
    for failure in &seeded {
        assert!(failure.x[0] > 1e10);
        assert!(matches!(failure.error, DensityError::EvaluationFailure { .. }));
    }
    assert_eq!(seeded, explicit);
}

#[test]
// Purpose
// -------
// Stress gradients of a wrapped density and confirm that a well-behaved
// density survives heavy-tailed draws.
//
// Given
// -----
// - `NegSumSquares` under ReverseDiff, 300 draws at the default scale.
//
// Expect
// ------
// - No failures.
fn stresstest_over_gradients_of_well_behaved_density() {
    let grad = ADGradient::new(ADBackend::ReverseDiff, NegSumSquares { dim: 3 }, ADOptions::default()).unwrap();
    let options = StressOptions { count: 300, ..StressOptions::default() };

    let failures = stresstest_seeded(|p, x| logdensity_and_gradient(p, x), &grad, &options, 11).unwrap();

    assert!(failures.is_empty());
}

#[test]
// Purpose
// -------
// Run the chunk benchmark scenario.
//
// Given
// -----
// - A 2-dimensional density, chunk sizes `[1, 2]`.
//
// Expect
// ------
// - Exactly two pairs, in the order `[1, 2]`.
fn benchmark_chunks_returns_pairs_in_given_order() {
    let problem = NegSumSquares { dim: 2 };
    let options = ChunkBenchmarkOptions::new(Some(vec![1, 2]), false, Some(array![0.5, -0.5]), 10).unwrap();

    let results = benchmark_chunks(&problem, &options).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, 1);
    assert_eq!(results[1].0, 2);
}

#[test]
// Purpose
// -------
// Classify type-erased handles without evaluating them.
//
// Given
// -----
// - A boxed AD wrapper and a boxed value-only closure.
//
// Expect
// ------
// - `Order1` and `Order0` respectively; `None` for a non-density value.
fn type_erased_handles_are_classified() {
    let wrapped: DynLogDensity =
        Box::new(ADGradient::new(ADBackend::ReverseDiff, NegSumSquares { dim: 2 }, ADOptions::default()).unwrap());
    let plain: DynLogDensity = Box::new(FnLogDensity::new(1, |_x: &[f64]| -> DensityResult<f64> {
        panic!("must not be evaluated")
    }));

    assert_eq!(probe_capabilities(&wrapped), Some(LogDensityOrder::Order1));
    assert_eq!(probe_capabilities(&plain), Some(LogDensityOrder::Order0));
    assert_eq!(probe_capabilities(&42_u8), None);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
// Purpose
// -------
// Share one gradient wrapper per engine across threads and check that
// concurrent calls see no shared scratch state.
//
// Given
// -----
// - The constrained problem wrapped by FiniteDiff, ForwardDiff (chunk 2)
//   and ReverseDiff.
// - 8 scoped threads per wrapper, each evaluating the same 4 points 25
//   times.
//
// Expect
// ------
// - The wrapper type is `Send + Sync`.
// - Every thread reproduces the single-threaded `(value, gradient)`
//   exactly.
fn gradient_wrappers_are_shareable_across_threads() {
    assert_send_sync::<ADGradient<TransformedLogDensity<VectorTransform, ScaleProbMean>>>();

    let points = [[0.3, -0.7, 1.2], [-1.0, 0.5, 0.0], [2.0, 3.0, -2.5], [0.0, 0.0, 0.0]];
    let wrappers = [
        ADGradient::new(ADBackend::FiniteDiff, constrained_problem(), ADOptions::default()).unwrap(),
        ADGradient::new(ADBackend::ForwardDiff, constrained_problem(), ADOptions::with_chunk(2).unwrap()).unwrap(),
        ADGradient::new(ADBackend::ReverseDiff, constrained_problem(), ADOptions::default()).unwrap(),
    ];

    for grad in &wrappers {
        // Arrange
        let expected: Vec<(f64, Grad)> =
            points.iter().map(|x| logdensity_and_gradient(grad, x).unwrap()).collect();

        // Act
        let per_thread: Vec<Vec<(f64, Grad)>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut last: Vec<(f64, Grad)> = Vec::new();
                        for _ in 0..25 {
                            last = points.iter().map(|x| logdensity_and_gradient(grad, x).unwrap()).collect();
                        }
                        last
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Assert
        for results in &per_thread {
            assert_eq!(results, &expected, "{grad} diverged across threads");
        }
    }
}
