//! Storage clients used by the benchmark driver.
//!
//! The benchmark only talks to storage through the [`StorageClient`] trait. Each worker owns its
//! own handle, obtained from [`connect`] with the configured endpoint URI. Dropping a handle
//! releases it.
//!
//! The following endpoint schemes are supported:
//!
//!  - `mem://<name>`: An in-process store. All handles connected to the same name share the same
//!    objects, just like independent connections to a single server would.
//!  - `file://<path>`: A directory on the local filesystem. Containers are sub-directories, objects
//!    are files within them.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod client;
mod error;
mod local_fs;
mod memory;

pub use client::{BoxedClient, CreateOutcome, StorageClient};
pub use error::{StorageError, StorageResult};
pub use local_fs::LocalFsClient;
pub use memory::MemoryClient;

/// Opens a new client handle for the given endpoint URI.
///
/// Every call returns an independent handle. Handles for the same endpoint observe the same
/// containers and objects.
pub fn connect(uri: &str) -> StorageResult<BoxedClient> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(StorageError::invalid_uri(uri, "missing `<scheme>://` prefix"));
    };

    match scheme {
        "mem" => {
            if rest.is_empty() {
                return Err(StorageError::invalid_uri(uri, "missing store name"));
            }
            Ok(Box::new(MemoryClient::named(rest)))
        }
        "file" => {
            if rest.is_empty() {
                return Err(StorageError::invalid_uri(uri, "missing directory path"));
            }
            Ok(Box::new(LocalFsClient::new(rest)))
        }
        other => Err(StorageError::invalid_uri(
            uri,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connects_known_schemes() {
        assert_eq!(connect("mem://connect-test").unwrap().name(), "memory");
        assert_eq!(connect("file:///tmp/blobbench").unwrap().name(), "local-fs");
    }

    #[test]
    fn rejects_invalid_uris() {
        for uri in ["", "localhost:9000", "mem://", "file://", "s3://bucket"] {
            let err = connect(uri).unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidUri { .. }),
                "{uri}: unexpected {err:?}"
            );
        }
    }
}
