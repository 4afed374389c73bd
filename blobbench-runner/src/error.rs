//! Errors that abort a benchmark run.

use blobbench_storage::StorageError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::phase::PhaseKind;

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A storage client handle could not be opened.
    #[error("unable to initialize storage client")]
    Connect(#[source] StorageError),

    /// The container could not be created.
    #[error("unable to create container `{container}`")]
    CreateContainer {
        /// Name of the container.
        container: String,
        /// The underlying storage error.
        #[source]
        cause: StorageError,
    },

    /// Pre-existing objects could not be removed from the container.
    #[error("unable to purge container `{container}`")]
    PurgeContainer {
        /// Name of the container.
        container: String,
        /// The underlying storage error.
        #[source]
        cause: StorageError,
    },

    /// A storage operation failed while a phase was running.
    #[error("error during {phase} of object `{key}`")]
    Phase {
        /// The phase that failed.
        phase: PhaseKind,
        /// Key of the object being processed.
        key: String,
        /// The underlying storage error.
        #[source]
        cause: StorageError,
    },

    /// The upload phase finished without writing any object, leaving nothing to read or delete.
    #[error("loop {loop_index}: upload phase did not write any objects")]
    NothingUploaded {
        /// The 1-based loop iteration.
        loop_index: u32,
    },

    /// A worker task panicked or was cancelled by the runtime.
    #[error("worker task failed")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result type for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;
