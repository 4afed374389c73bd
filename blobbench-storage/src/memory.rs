//! In-process storage backend.
//!
//! This provides a [`StorageClient`] backed by a `HashMap`, removing the need for a running storage
//! server in tests and dry runs. Stores are registered by name in a process-wide registry, so that
//! independently connected handles for `mem://<name>` observe the same objects.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use bytes::{Bytes, BytesMut};

use crate::client::{CreateOutcome, StorageClient};
use crate::error::{StorageError, StorageResult};

type Container = HashMap<String, Bytes>;
type Store = HashMap<String, Container>;

static REGISTRY: LazyLock<Mutex<HashMap<String, Arc<Mutex<Store>>>>> =
    LazyLock::new(Default::default);

/// A handle to an in-process store.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    store: Arc<Mutex<Store>>,
}

impl MemoryClient {
    /// Opens a handle to the named store, creating it on first use.
    pub fn named(name: &str) -> Self {
        let store = REGISTRY
            .lock()
            .unwrap()
            .entry(name.to_owned())
            .or_default()
            .clone();
        Self { store }
    }

    /// Opens a handle to a fresh store that is not registered under any name.
    pub fn isolated() -> Self {
        Self {
            store: Default::default(),
        }
    }

    /// Returns the number of objects in the container, or `None` if it does not exist.
    pub fn object_count(&self, container: &str) -> Option<usize> {
        self.store.lock().unwrap().get(container).map(|c| c.len())
    }

    /// Returns `true` if the object exists.
    pub fn contains(&self, container: &str, key: &str) -> bool {
        self.store
            .lock()
            .unwrap()
            .get(container)
            .is_some_and(|c| c.contains_key(key))
    }
}

#[async_trait::async_trait]
impl StorageClient for MemoryClient {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_container(&self, container: &str) -> StorageResult<CreateOutcome> {
        let mut store = self.store.lock().unwrap();
        if store.contains_key(container) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        store.insert(container.to_owned(), Container::new());
        Ok(CreateOutcome::Created)
    }

    async fn purge_container(&self, container: &str) -> StorageResult<()> {
        let mut store = self.store.lock().unwrap();
        let objects = store
            .get_mut(container)
            .ok_or_else(|| StorageError::no_such_container(container))?;
        objects.clear();
        Ok(())
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        payload: Bytes,
        offset: u64,
    ) -> StorageResult<()> {
        let mut store = self.store.lock().unwrap();
        let objects = store
            .get_mut(container)
            .ok_or_else(|| StorageError::no_such_container(container))?;

        if offset == 0 {
            objects.insert(key.to_owned(), payload);
            return Ok(());
        }

        let range = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(payload.len())?))
            .ok_or_else(|| {
                StorageError::generic(
                    format!("writing `{container}/{key}` at offset {offset}"),
                    "offset exceeds addressable memory",
                )
            })?;

        let existing = objects.remove(key).unwrap_or_default();
        let mut buf = BytesMut::from(&existing[..]);
        if buf.len() < range.end {
            buf.resize(range.end, 0);
        }
        buf[range].copy_from_slice(&payload);
        objects.insert(key.to_owned(), buf.freeze());

        Ok(())
    }

    async fn read_object(&self, container: &str, key: &str) -> StorageResult<u64> {
        let store = self.store.lock().unwrap();
        let objects = store
            .get(container)
            .ok_or_else(|| StorageError::no_such_container(container))?;
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::no_such_object(container, key))?;
        Ok(object.len() as u64)
    }

    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()> {
        let mut store = self.store.lock().unwrap();
        let objects = store
            .get_mut(container)
            .ok_or_else(|| StorageError::no_such_container(container))?;
        match objects.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::no_such_object(container, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_container_is_idempotent() {
        let client = MemoryClient::isolated();
        assert_eq!(
            client.create_container("bucket").await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            client.create_container("bucket").await.unwrap(),
            CreateOutcome::AlreadyExists
        );
    }

    #[tokio::test]
    async fn named_handles_share_objects() {
        let writer = MemoryClient::named("shared-handles");
        let reader = MemoryClient::named("shared-handles");

        writer.create_container("bucket").await.unwrap();
        writer
            .write_object("bucket", "Object-1", Bytes::from_static(b"hello"), 0)
            .await
            .unwrap();

        assert_eq!(reader.read_object("bucket", "Object-1").await.unwrap(), 5);
        assert!(MemoryClient::isolated().object_count("bucket").is_none());
    }

    #[tokio::test]
    async fn write_at_offset_extends_object() {
        let client = MemoryClient::isolated();
        client.create_container("bucket").await.unwrap();
        client
            .write_object("bucket", "key", Bytes::from_static(b"abc"), 0)
            .await
            .unwrap();
        client
            .write_object("bucket", "key", Bytes::from_static(b"xyz"), 5)
            .await
            .unwrap();

        assert_eq!(client.read_object("bucket", "key").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn purge_and_delete() {
        let client = MemoryClient::isolated();
        client.create_container("bucket").await.unwrap();
        for key in ["a", "b", "c"] {
            client
                .write_object("bucket", key, Bytes::from_static(b"x"), 0)
                .await
                .unwrap();
        }

        client.delete_object("bucket", "a").await.unwrap();
        assert!(!client.contains("bucket", "a"));
        assert!(matches!(
            client.delete_object("bucket", "a").await,
            Err(StorageError::NoSuchObject { .. })
        ));

        client.purge_container("bucket").await.unwrap();
        assert_eq!(client.object_count("bucket"), Some(0));
    }

    #[tokio::test]
    async fn missing_container_fails() {
        let client = MemoryClient::isolated();
        let result = client
            .write_object("nope", "key", Bytes::from_static(b"x"), 0)
            .await;
        assert!(matches!(result, Err(StorageError::NoSuchContainer { .. })));
        assert!(client.purge_container("nope").await.is_err());
    }

    #[tokio::test]
    async fn rejects_unaddressable_offset() {
        let client = MemoryClient::isolated();
        client.create_container("bucket").await.unwrap();
        client
            .write_object("bucket", "Object-1", Bytes::from_static(b"hello"), 0)
            .await
            .unwrap();

        let error = client
            .write_object("bucket", "Object-1", Bytes::from_static(b"x"), u64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(error, StorageError::Generic { .. }), "{error:?}");
        assert_eq!(client.read_object("bucket", "Object-1").await.unwrap(), 5);
    }
}
