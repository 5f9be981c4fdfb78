//! diagnostics::benchmark — forward-mode chunk size benchmark.
//!
//! For each candidate chunk size, wrap the density in a `ForwardDiff`
//! [`ADGradient`] with that chunk, evaluate the gradient once (propagating
//! any failure), then time `repetitions` gradient calls at a fixed point and
//! keep the fastest one. The result tells the caller which chunk to pick.
use std::{
    hint::black_box,
    io::Write,
    time::{Duration, Instant},
};

use log::info;
use ndarray::Array1;

use crate::{
    autodiff::{
        backends::{ADBackend, ADOptions},
        dual::MAX_CHUNK,
        gradient::ADGradient,
    },
    problems::{
        errors::{DensityError, DensityResult},
        traits::{DifferentiableLogDensity, LogDensityProblem},
        types::Theta,
        validation::validate_dimension,
    },
};

/// Default number of timed gradient calls per chunk size.
pub const DEFAULT_REPETITIONS: usize = 100;

/// Chunk benchmark configuration.
///
/// Fields:
/// - `chunk_sizes: Option<Vec<usize>>`: sizes to try, in order; `None`
///   tries `1..=min(dimension, MAX_CHUNK)`.
/// - `mark_progress: bool`: print one `.` per chunk size to stderr.
/// - `x: Option<Theta>`: evaluation point; `None` uses zeros.
/// - `repetitions: usize`: timed calls per chunk size (default 100).
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkBenchmarkOptions {
    pub chunk_sizes: Option<Vec<usize>>,
    pub mark_progress: bool,
    pub x: Option<Theta>,
    pub repetitions: usize,
}

impl ChunkBenchmarkOptions {
    /// # Errors
    /// Returns [`DensityError::InvalidRepetitions`] if `repetitions == 0`.
    pub fn new(
        chunk_sizes: Option<Vec<usize>>, mark_progress: bool, x: Option<Theta>, repetitions: usize,
    ) -> DensityResult<Self> {
        if repetitions == 0 {
            return Err(DensityError::InvalidRepetitions {
                repetitions,
                reason: "at least one timed repetition is required",
            });
        }
        Ok(ChunkBenchmarkOptions { chunk_sizes, mark_progress, x, repetitions })
    }
}

impl Default for ChunkBenchmarkOptions {
    fn default() -> Self {
        ChunkBenchmarkOptions { chunk_sizes: None, mark_progress: false, x: None, repetitions: DEFAULT_REPETITIONS }
    }
}

/// Time forward-mode gradients of `problem` for several chunk sizes.
///
/// Returns `(chunk, fastest per-call time)` pairs in the order tried.
///
/// # Errors
/// - [`DensityError::DimensionMismatch`] if `options.x` has the wrong length.
/// - [`DensityError::InvalidRepetitions`] if `options.repetitions == 0`.
/// - [`DensityError::InvalidChunkSize`] for a chunk size the forward engine
///   rejects.
/// - Any error raised while evaluating the gradient.
pub fn benchmark_chunks<P: DifferentiableLogDensity>(
    problem: &P, options: &ChunkBenchmarkOptions,
) -> DensityResult<Vec<(usize, Duration)>> {
    let dim = problem.dimension();
    if options.repetitions == 0 {
        return Err(DensityError::InvalidRepetitions {
            repetitions: 0,
            reason: "at least one timed repetition is required",
        });
    }
    let x = match &options.x {
        Some(x) => {
            let x = x.to_vec();
            validate_dimension(dim, &x)?;
            x
        }
        None => Array1::<f64>::zeros(dim).to_vec(),
    };
    let chunk_sizes = match &options.chunk_sizes {
        Some(sizes) => sizes.clone(),
        None => (1..=dim.min(MAX_CHUNK)).collect(),
    };

    let mut results = Vec::with_capacity(chunk_sizes.len());
    for chunk in chunk_sizes {
        let grad = ADGradient::new(ADBackend::ForwardDiff, problem, ADOptions::with_chunk(chunk)?)?;
        black_box(grad.logdensity_and_gradient(&x)?);

        let mut best = Duration::MAX;
        for _ in 0..options.repetitions {
            let start = Instant::now();
            let out = grad.logdensity_and_gradient(black_box(&x))?;
            best = best.min(start.elapsed());
            black_box(out);
        }
        results.push((chunk, best));

        if options.mark_progress {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, ".");
            let _ = err.flush();
        }
    }
    if options.mark_progress {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err);
    }

    info!("benchmark_chunks: dimension {dim}, {} chunk sizes timed", results.len());
    Ok(results)
}
