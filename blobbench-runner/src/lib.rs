//! A throughput benchmark for object storage backends.
//!
//! A run repeatedly cycles through three phases against a single container:
//!
//!  1. **Upload**: for a fixed duration, every worker writes fresh objects named `Object-<n>`,
//!     where `n` is claimed from a shared counter.
//!  2. **Download**: for the same duration, every worker reads random objects from the key space
//!     written in the upload phase.
//!  3. **Delete**: the workers jointly delete every uploaded object exactly once.
//!
//! Each phase is reported with its elapsed time, object count, throughput and slowdowns. See
//! [`Benchmark`] for the entry point and [`config`] for the available settings.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod counter;
pub mod error;
pub mod observability;
pub mod orchestrator;
pub mod payload;
pub mod phase;
pub mod report;
pub mod size;

pub use crate::config::BenchmarkConfig;
pub use crate::error::{BenchError, BenchResult};
pub use crate::orchestrator::Benchmark;
