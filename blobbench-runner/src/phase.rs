//! Concurrent execution of a single benchmark phase.
//!
//! A [`PhaseRunner`] spawns one worker task per storage handle. All workers of a phase share a
//! [`PhaseState`], which carries the stopping rule, the [`WorkloadCounter`] and the completion
//! signal. Uploads and downloads run until a shared deadline has passed, deletes run until the
//! key space written by the preceding upload phase has been exhausted.
//!
//! The first worker that hits a storage error records it and cancels the phase. All other workers
//! observe the cancellation before their next operation and exit, after which the runner returns
//! the recorded error.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use blobbench_storage::StorageClient;
use bytes::Bytes;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::counter::WorkloadCounter;
use crate::error::{BenchError, BenchResult};
use crate::payload::ObjectPayload;

/// Returns the key of the object with the given sequence number.
pub fn object_key(sequence: u64) -> String {
    format!("Object-{sequence}")
}

/// The kind of workload a phase executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseKind {
    /// Writes fresh objects until the deadline.
    Upload,
    /// Reads random uploaded objects until the deadline.
    Download,
    /// Deletes every uploaded object once.
    Delete,
}

impl PhaseKind {
    /// Short operation label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Upload => "PUT",
            PhaseKind::Download => "GET",
            PhaseKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhaseKind::Upload => "upload",
            PhaseKind::Download => "download",
            PhaseKind::Delete => "delete",
        })
    }
}

/// A phase to run, along with its stopping rule.
#[derive(Clone, Copy, Debug)]
pub enum Phase {
    /// Upload objects `Object-1`, `Object-2`, ... until `duration` has passed.
    Upload {
        /// How long workers keep starting new uploads.
        duration: Duration,
    },
    /// Read uniformly random objects from `Object-1..=Object-<key_space>` until `duration` has
    /// passed.
    Download {
        /// How long workers keep starting new downloads.
        duration: Duration,
        /// Number of objects written by the preceding upload phase.
        key_space: u64,
    },
    /// Delete `Object-1..=Object-<key_space>`, each exactly once.
    Delete {
        /// Number of objects written by the preceding upload phase.
        key_space: u64,
    },
}

impl Phase {
    /// The kind of workload of this phase.
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Upload { .. } => PhaseKind::Upload,
            Phase::Download { .. } => PhaseKind::Download,
            Phase::Delete { .. } => PhaseKind::Delete,
        }
    }

    fn duration(&self) -> Option<Duration> {
        match *self {
            Phase::Upload { duration } | Phase::Download { duration, .. } => Some(duration),
            Phase::Delete { .. } => None,
        }
    }

    fn key_space(&self) -> u64 {
        match *self {
            Phase::Upload { .. } => 0,
            Phase::Download { key_space, .. } | Phase::Delete { key_space } => key_space,
        }
    }
}

/// State shared by all workers of one phase.
///
/// A fresh state is created for every phase, so counters never carry over between phases or loop
/// iterations.
#[derive(Debug)]
pub struct PhaseState {
    kind: PhaseKind,
    deadline: Option<Instant>,
    key_space: u64,
    counter: WorkloadCounter,
    remaining: AtomicUsize,
    last_finish: Mutex<Option<Instant>>,
    all_finished: Notify,
    cancel: CancellationToken,
    failure: Mutex<Option<BenchError>>,
}

impl PhaseState {
    /// Creates the state for a phase with the given number of workers.
    pub fn new(kind: PhaseKind, workers: usize, deadline: Option<Instant>, key_space: u64) -> Self {
        Self {
            kind,
            deadline,
            key_space,
            counter: WorkloadCounter::new(),
            remaining: AtomicUsize::new(workers),
            last_finish: Mutex::new(None),
            all_finished: Notify::new(),
            cancel: CancellationToken::new(),
            failure: Mutex::new(None),
        }
    }

    /// The counters updated by the workers.
    pub fn counter(&self) -> &WorkloadCounter {
        &self.counter
    }

    /// Number of workers that have not exited yet.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// The latest finish time reported by any worker.
    pub fn last_finish(&self) -> Option<Instant> {
        *self.last_finish.lock().unwrap()
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Records the first error of the phase and tells all workers to stop.
    fn fail(&self, error: BenchError) {
        let mut failure = self.failure.lock().unwrap();
        if failure.is_none() {
            tracing::error!(error = &error as &dyn std::error::Error, "phase failed");
            *failure = Some(error);
        }
        self.cancel.cancel();
    }

    fn take_failure(&self) -> Option<BenchError> {
        self.failure.lock().unwrap().take()
    }

    fn finish_worker(&self) {
        let now = Instant::now();
        {
            let mut last_finish = self.last_finish.lock().unwrap();
            *last_finish = Some(last_finish.map_or(now, |last| last.max(now)));
        }

        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.all_finished.notify_waiters();
        }
    }

    /// Waits until every worker has exited.
    pub async fn wait_all(&self) {
        loop {
            let notified = self.all_finished.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks its worker as finished when dropped, even if the worker panics.
struct FinishGuard(Arc<PhaseState>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish_worker();
    }
}

/// Everything a single worker task needs.
struct Worker {
    id: usize,
    client: Arc<dyn StorageClient>,
    container: Arc<str>,
    payload: Bytes,
    slowdown_threshold: Option<Duration>,
    state: Arc<PhaseState>,
}

impl Worker {
    async fn run(self) {
        let _guard = FinishGuard(Arc::clone(&self.state));

        match self.state.kind {
            PhaseKind::Upload => self.upload().await,
            PhaseKind::Download => self.download().await,
            PhaseKind::Delete => self.delete().await,
        }

        tracing::trace!(worker = self.id, phase = %self.state.kind, "worker finished");
    }

    async fn upload(&self) {
        while !self.state.should_stop() {
            let key = object_key(self.state.counter.claim());
            let start = Instant::now();
            let result = self
                .client
                .write_object(&self.container, &key, self.payload.clone(), 0)
                .await;
            if !self.complete(key, start, result) {
                return;
            }
        }
    }

    async fn download(&self) {
        if self.state.key_space == 0 {
            return;
        }

        let mut rng = SmallRng::seed_from_u64(rand::random());
        while !self.state.should_stop() {
            let key = object_key(rng.random_range(1..=self.state.key_space));
            let start = Instant::now();
            let result = self
                .client
                .read_object(&self.container, &key)
                .await
                .map(|_| ());
            if !self.complete(key, start, result) {
                return;
            }
        }
    }

    async fn delete(&self) {
        while !self.state.should_stop() {
            let sequence = self.state.counter.claim();
            if sequence > self.state.key_space {
                return;
            }

            let key = object_key(sequence);
            let start = Instant::now();
            let result = self.client.delete_object(&self.container, &key).await;
            if !self.complete(key, start, result) {
                return;
            }
        }
    }

    /// Records the outcome of one operation. Returns `false` if the worker must stop.
    fn complete(
        &self,
        key: String,
        start: Instant,
        result: blobbench_storage::StorageResult<()>,
    ) -> bool {
        match result {
            Ok(()) => {
                self.state
                    .counter
                    .record(start.elapsed(), self.slowdown_threshold);
                true
            }
            Err(cause) => {
                self.state.fail(BenchError::Phase {
                    phase: self.state.kind,
                    key,
                    cause,
                });
                false
            }
        }
    }
}

/// The measured result of a phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseOutcome {
    /// The phase that was run.
    pub kind: PhaseKind,
    /// Time from phase start until the last worker exited.
    pub elapsed: Duration,
    /// Number of successfully processed objects.
    pub objects: u64,
    /// Number of operations slower than the slowdown threshold.
    pub slowdowns: u64,
}

/// Runs phases with one worker per storage handle.
#[derive(Debug)]
pub struct PhaseRunner {
    clients: Vec<Arc<dyn StorageClient>>,
    container: Arc<str>,
    payload: ObjectPayload,
    slowdown_threshold: Option<Duration>,
}

impl PhaseRunner {
    /// Creates a runner that spawns one worker for each of the given client handles.
    pub fn new(
        clients: Vec<Arc<dyn StorageClient>>,
        container: &str,
        payload: ObjectPayload,
        slowdown_threshold: Option<Duration>,
    ) -> Self {
        Self {
            clients,
            container: container.into(),
            payload,
            slowdown_threshold,
        }
    }

    /// Number of workers spawned per phase.
    pub fn workers(&self) -> usize {
        self.clients.len()
    }

    /// Runs the phase to completion and measures it.
    ///
    /// Returns the first storage error encountered by any worker.
    pub async fn run(&self, phase: Phase) -> BenchResult<PhaseOutcome> {
        let kind = phase.kind();
        let start = Instant::now();
        let deadline = phase.duration().map(|duration| start + duration);
        let state = Arc::new(PhaseState::new(
            kind,
            self.clients.len(),
            deadline,
            phase.key_space(),
        ));

        tracing::debug!(phase = %kind, workers = self.clients.len(), "starting phase");

        let tasks: Vec<_> = self
            .clients
            .iter()
            .enumerate()
            .map(|(id, client)| {
                let worker = Worker {
                    id,
                    client: Arc::clone(client),
                    container: Arc::clone(&self.container),
                    payload: self.payload.bytes(),
                    slowdown_threshold: self.slowdown_threshold,
                    state: Arc::clone(&state),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        state.wait_all().await;
        for result in futures::future::join_all(tasks).await {
            result?;
        }

        if let Some(error) = state.take_failure() {
            return Err(error);
        }

        let finish = state.last_finish().unwrap_or(start);
        let outcome = PhaseOutcome {
            kind,
            elapsed: finish.duration_since(start),
            objects: state.counter().completed(),
            slowdowns: state.counter().slowdowns(),
        };
        tracing::debug!(?outcome, "phase finished");

        Ok(outcome)
    }
}
