//! diagnostics — tools for checking and tuning log densities.
//!
//! Purpose
//! -------
//! Help users find numerical problems in a density before a sampler does,
//! and pick a forward-mode chunk size for it.
//!
//! Key behaviors
//! -------------
//! - [`stress::stresstest`] evaluates a density at heavy-tailed random
//!   points and returns the points where evaluation failed.
//! - [`benchmark::benchmark_chunks`] times forward-mode gradients for a
//!   range of chunk sizes.
//!
//! Conventions
//! -----------
//! - Both entry points take the density by reference and never mutate it.
//! - Summaries are emitted through `log` at info level.
pub mod benchmark;
pub mod stress;

pub use self::benchmark::{ChunkBenchmarkOptions, benchmark_chunks};
pub use self::stress::{StressFailure, StressOptions, StressScale, stresstest, stresstest_seeded};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_logdensity::diagnostics::prelude::*;
//
// to import the diagnostics in a single line.

pub mod prelude {
    pub use super::benchmark::{ChunkBenchmarkOptions, DEFAULT_REPETITIONS, benchmark_chunks};
    pub use super::stress::{
        DEFAULT_STRESS_COUNT, StressFailure, StressOptions, StressScale, stresstest, stresstest_seeded,
    };
}
