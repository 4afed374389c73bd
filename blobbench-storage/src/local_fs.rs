use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};

use crate::client::{CreateOutcome, StorageClient};
use crate::error::{StorageError, StorageResult};

/// A storage client that keeps containers as directories on the local filesystem.
#[derive(Debug)]
pub struct LocalFsClient {
    path: PathBuf,
}

impl LocalFsClient {
    /// Creates a client rooted at the given directory.
    ///
    /// The directory is created along with the first container.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().into(),
        }
    }

    async fn container_dir(&self, container: &str) -> StorageResult<PathBuf> {
        let dir = self.path.join(container);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StorageError::no_such_container(container)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::no_such_container(container))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait::async_trait]
impl StorageClient for LocalFsClient {
    fn name(&self) -> &'static str {
        "local-fs"
    }

    async fn create_container(&self, container: &str) -> StorageResult<CreateOutcome> {
        tokio::fs::create_dir_all(&self.path).await?;
        match tokio::fs::create_dir(self.path.join(container)).await {
            Ok(()) => Ok(CreateOutcome::Created),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    async fn purge_container(&self, container: &str) -> StorageResult<()> {
        let dir = self.container_dir(container).await?;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut purged = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                purged += 1;
            }
        }
        tracing::debug!(container, purged, "purged container");
        Ok(())
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        payload: Bytes,
        offset: u64,
    ) -> StorageResult<()> {
        let path = self.container_dir(container).await?.join(key);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(offset == 0)
            .open(path)
            .await?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }

        let mut writer = BufWriter::new(file);
        writer.write_all(&payload).await?;
        writer.flush().await?;
        let file = writer.into_inner();
        file.sync_data().await?;

        Ok(())
    }

    async fn read_object(&self, container: &str, key: &str) -> StorageResult<u64> {
        let path = self.container_dir(container).await?.join(key);
        let mut file = match OpenOptions::new().read(true).open(path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::no_such_object(container, key));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(tokio::io::copy(&mut file, &mut tokio::io::sink()).await?)
    }

    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()> {
        let path = self.container_dir(container).await?.join(key);
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::no_such_object(container, key))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_delete() {
        let tempdir = tempfile::tempdir().unwrap();
        let client = LocalFsClient::new(tempdir.path().join("root"));

        assert_eq!(
            client.create_container("bucket").await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            client.create_container("bucket").await.unwrap(),
            CreateOutcome::AlreadyExists
        );

        let payload = Bytes::from(vec![7u8; 4096]);
        client
            .write_object("bucket", "Object-1", payload, 0)
            .await
            .unwrap();
        assert_eq!(client.read_object("bucket", "Object-1").await.unwrap(), 4096);

        client.delete_object("bucket", "Object-1").await.unwrap();
        assert!(matches!(
            client.read_object("bucket", "Object-1").await,
            Err(StorageError::NoSuchObject { .. })
        ));
    }

    #[tokio::test]
    async fn overwrite_truncates() {
        let tempdir = tempfile::tempdir().unwrap();
        let client = LocalFsClient::new(tempdir.path());
        client.create_container("bucket").await.unwrap();

        client
            .write_object("bucket", "key", Bytes::from(vec![1u8; 100]), 0)
            .await
            .unwrap();
        client
            .write_object("bucket", "key", Bytes::from(vec![2u8; 10]), 0)
            .await
            .unwrap();
        assert_eq!(client.read_object("bucket", "key").await.unwrap(), 10);

        client
            .write_object("bucket", "key", Bytes::from(vec![3u8; 10]), 20)
            .await
            .unwrap();
        assert_eq!(client.read_object("bucket", "key").await.unwrap(), 30);
    }

    #[tokio::test]
    async fn purge_removes_objects() {
        let tempdir = tempfile::tempdir().unwrap();
        let client = LocalFsClient::new(tempdir.path());
        client.create_container("bucket").await.unwrap();
        for n in 1..=5 {
            client
                .write_object("bucket", &format!("Object-{n}"), Bytes::from_static(b"x"), 0)
                .await
                .unwrap();
        }

        client.purge_container("bucket").await.unwrap();

        let remaining = std::fs::read_dir(tempdir.path().join("bucket"))
            .unwrap()
            .count();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn missing_container_fails() {
        let tempdir = tempfile::tempdir().unwrap();
        let client = LocalFsClient::new(tempdir.path());
        let result = client.read_object("nope", "key").await;
        assert!(matches!(result, Err(StorageError::NoSuchContainer { .. })));
    }
}
