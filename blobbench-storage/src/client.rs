use std::fmt::Debug;

use bytes::Bytes;

use crate::error::StorageResult;

/// A type-erased [`StorageClient`] instance.
pub type BoxedClient = Box<dyn StorageClient>;

/// Result of [`StorageClient::create_container`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The container did not exist and has been created.
    Created,
    /// The container existed already. This is not an error.
    AlreadyExists,
}

/// A handle to an object storage backend.
///
/// All operations address objects by container name and key. Any failure other than an existing
/// container on creation is reported as a [`StorageError`](crate::StorageError).
#[async_trait::async_trait]
pub trait StorageClient: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Creates the container, tolerating an existing one.
    async fn create_container(&self, container: &str) -> StorageResult<CreateOutcome>;

    /// Removes all objects from the container, keeping the container itself.
    async fn purge_container(&self, container: &str) -> StorageResult<()>;

    /// Writes `payload` into the object at the given byte offset.
    ///
    /// An offset of zero replaces the object. The object is created if it does not exist.
    async fn write_object(
        &self,
        container: &str,
        key: &str,
        payload: Bytes,
        offset: u64,
    ) -> StorageResult<()>;

    /// Reads the full object and discards its contents, returning the number of bytes read.
    async fn read_object(&self, container: &str, key: &str) -> StorageResult<u64>;

    /// Deletes the object.
    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()>;
}
