//! Instrumented storage clients.
//!
//! [`RecordingClient`] stores objects in an isolated [`MemoryClient`] and records every key it was
//! asked to write, read or delete. It can additionally inject latency and failures. All clones
//! share the same store and recordings, so tests can hand one clone to every worker and keep
//! another one for inspection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blobbench_storage::{CreateOutcome, MemoryClient, StorageClient, StorageError, StorageResult};
use bytes::Bytes;

#[derive(Debug, Default)]
struct Recorded {
    writes: Vec<String>,
    reads: Vec<String>,
    deletes: Vec<String>,
    creates: usize,
    purges: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    op_delay: Option<Duration>,
    fail_write_after: Option<u64>,
    fail_reads: bool,
}

/// A [`StorageClient`] that records all calls made against it.
#[derive(Debug, Clone)]
pub struct RecordingClient {
    inner: MemoryClient,
    recorded: Arc<Mutex<Recorded>>,
    faults: Faults,
    writes_seen: Arc<AtomicU64>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingClient {
    /// Creates a client with a fresh, empty store.
    pub fn new() -> Self {
        Self {
            inner: MemoryClient::isolated(),
            recorded: Default::default(),
            faults: Default::default(),
            writes_seen: Default::default(),
        }
    }

    /// Sleeps for the given duration before every object operation.
    ///
    /// Faults are copied into clones, so configure them before handing out clones.
    pub fn with_op_delay(mut self, delay: Duration) -> Self {
        self.faults.op_delay = Some(delay);
        self
    }

    /// Lets the first `count` writes succeed and fails every write after that.
    pub fn failing_writes_after(mut self, count: u64) -> Self {
        self.faults.fail_write_after = Some(count);
        self
    }

    /// Fails every read.
    pub fn failing_reads(mut self) -> Self {
        self.faults.fail_reads = true;
        self
    }

    /// Keys passed to successful `write_object` calls, in completion order.
    pub fn written_keys(&self) -> Vec<String> {
        self.recorded.lock().unwrap().writes.clone()
    }

    /// Keys passed to successful `read_object` calls, in completion order.
    pub fn read_keys(&self) -> Vec<String> {
        self.recorded.lock().unwrap().reads.clone()
    }

    /// Keys passed to successful `delete_object` calls, in completion order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.recorded.lock().unwrap().deletes.clone()
    }

    /// Number of `create_container` calls.
    pub fn create_calls(&self) -> usize {
        self.recorded.lock().unwrap().creates
    }

    /// Number of `purge_container` calls.
    pub fn purge_calls(&self) -> usize {
        self.recorded.lock().unwrap().purges
    }

    /// Returns the number of objects in the container, or `None` if it does not exist.
    pub fn object_count(&self, container: &str) -> Option<usize> {
        self.inner.object_count(container)
    }

    async fn delay(&self) {
        if let Some(delay) = self.faults.op_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn injected(context: &str) -> StorageError {
    StorageError::Generic {
        context: context.to_owned(),
        cause: "injected failure".into(),
    }
}

#[async_trait::async_trait]
impl StorageClient for RecordingClient {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn create_container(&self, container: &str) -> StorageResult<CreateOutcome> {
        self.recorded.lock().unwrap().creates += 1;
        self.inner.create_container(container).await
    }

    async fn purge_container(&self, container: &str) -> StorageResult<()> {
        self.recorded.lock().unwrap().purges += 1;
        self.inner.purge_container(container).await
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        payload: Bytes,
        offset: u64,
    ) -> StorageResult<()> {
        self.delay().await;
        let seen = self.writes_seen.fetch_add(1, Ordering::Relaxed);
        if self.faults.fail_write_after.is_some_and(|limit| seen >= limit) {
            return Err(injected("writing object"));
        }
        self.inner
            .write_object(container, key, payload, offset)
            .await?;
        self.recorded.lock().unwrap().writes.push(key.to_owned());
        Ok(())
    }

    async fn read_object(&self, container: &str, key: &str) -> StorageResult<u64> {
        self.delay().await;
        if self.faults.fail_reads {
            return Err(injected("reading object"));
        }
        let len = self.inner.read_object(container, key).await?;
        self.recorded.lock().unwrap().reads.push(key.to_owned());
        Ok(len)
    }

    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()> {
        self.delay().await;
        self.inner.delete_object(container, key).await?;
        self.recorded.lock().unwrap().deletes.push(key.to_owned());
        Ok(())
    }
}
