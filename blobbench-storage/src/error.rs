use thiserror::Error;

/// Errors returned by [`StorageClient`](crate::StorageClient) operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The endpoint URI could not be resolved to a backend.
    #[error("invalid storage uri `{uri}`: {reason}")]
    InvalidUri {
        /// The URI as given.
        uri: String,
        /// Why the URI was rejected.
        reason: String,
    },

    /// The addressed container does not exist.
    #[error("container `{container}` does not exist")]
    NoSuchContainer {
        /// Name of the missing container.
        container: String,
    },

    /// The addressed object does not exist.
    #[error("object `{container}/{key}` does not exist")]
    NoSuchObject {
        /// Name of the container.
        container: String,
        /// Key of the missing object.
        key: String,
    },

    /// IO errors related to file operations.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error stemming from a backend.
    #[error("storage backend error: {context}")]
    Generic {
        /// What the backend was doing.
        context: String,
        /// The underlying cause.
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    pub(crate) fn invalid_uri(uri: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn no_such_container(container: &str) -> Self {
        Self::NoSuchContainer {
            container: container.to_owned(),
        }
    }

    pub(crate) fn generic(
        context: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Generic {
            context: context.into(),
            cause: cause.into(),
        }
    }

    pub(crate) fn no_such_object(container: &str, key: &str) -> Self {
        Self::NoSuchObject {
            container: container.to_owned(),
            key: key.to_owned(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
