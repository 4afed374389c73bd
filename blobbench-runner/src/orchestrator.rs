//! Sequencing of phases and loop iterations.
//!
//! A [`Benchmark`] prepares the container once, then runs the configured number of loop iterations
//! strictly one after another. Each iteration runs the upload, download and delete phases in that
//! order and reports one line per phase. The upload count is fixed when the upload phase returns,
//! so the following phases only ever address objects that were actually written.

use std::sync::Arc;

use blobbench_storage::{CreateOutcome, StorageClient};

use crate::config::{BenchmarkConfig, ConfigError};
use crate::error::{BenchError, BenchResult};
use crate::payload::ObjectPayload;
use crate::phase::{Phase, PhaseRunner};
use crate::report::{LoopReport, LoopResult, ReportSink};

/// Drives a complete benchmark run.
#[derive(Debug)]
pub struct Benchmark {
    config: BenchmarkConfig,
    admin: Arc<dyn StorageClient>,
    runner: PhaseRunner,
    sink: ReportSink,
}

impl Benchmark {
    /// Opens one storage handle per worker for the configured endpoint.
    pub fn connect(config: BenchmarkConfig) -> BenchResult<Self> {
        if config.threads == 0 {
            return Err(ConfigError::InvalidThreads(config.threads).into());
        }

        let clients = (0..config.threads)
            .map(|_| {
                blobbench_storage::connect(&config.storage_uri).map(Arc::<dyn StorageClient>::from)
            })
            .collect::<Result<Vec<Arc<dyn StorageClient>>, _>>()
            .map_err(BenchError::Connect)?;

        tracing::info!(
            backend = clients[0].name(),
            handles = clients.len(),
            "connected to storage"
        );

        Ok(Self::with_clients(config, clients))
    }

    /// Creates a benchmark that uses the given handles, one per worker.
    ///
    /// The first handle is also used to create and purge the container.
    ///
    /// # Panics
    ///
    /// Panics if `clients` is empty.
    pub fn with_clients(config: BenchmarkConfig, clients: Vec<Arc<dyn StorageClient>>) -> Self {
        assert!(!clients.is_empty(), "at least one storage client is required");

        let admin = Arc::clone(&clients[0]);
        let payload = ObjectPayload::random(config.object_size.as_u64() as usize);
        let runner = PhaseRunner::new(
            clients,
            &config.container,
            payload,
            config.slowdown_threshold,
        );
        let sink = ReportSink::new(config.log_file.clone());

        Self {
            config,
            admin,
            runner,
            sink,
        }
    }

    /// Creates the container if needed and removes all objects from it.
    pub async fn prepare(&self) -> BenchResult<()> {
        let container = &self.config.container;

        let outcome = self
            .admin
            .create_container(container)
            .await
            .map_err(|cause| BenchError::CreateContainer {
                container: container.clone(),
                cause,
            })?;
        if outcome == CreateOutcome::AlreadyExists {
            tracing::debug!(container, "container exists already");
        }

        self.admin
            .purge_container(container)
            .await
            .map_err(|cause| BenchError::PurgeContainer {
                container: container.clone(),
                cause,
            })?;

        tracing::info!(container, "container ready");
        Ok(())
    }

    /// Prepares the container and runs all loop iterations.
    ///
    /// Stops at the first error. Reports of completed iterations have already been emitted at
    /// that point, the failed iteration is not reported.
    pub async fn run(&self) -> BenchResult<Vec<LoopReport>> {
        self.sink
            .emit(&format!("Parameters: {}", self.config))
            .await;

        self.prepare().await?;

        let mut reports = Vec::with_capacity(self.config.loops as usize);
        for loop_index in 1..=self.config.loops {
            reports.push(self.run_loop(loop_index).await?);
        }

        Ok(reports)
    }

    /// Runs the upload, download and delete phases of one loop iteration.
    ///
    /// The report lines are emitted once all three phases have succeeded.
    pub async fn run_loop(&self, loop_index: u32) -> BenchResult<LoopReport> {
        let duration = self.config.duration;
        let object_size = self.config.object_size;

        let upload = self.runner.run(Phase::Upload { duration }).await?;
        let key_space = upload.objects;
        if key_space == 0 {
            return Err(BenchError::NothingUploaded { loop_index });
        }
        let upload = LoopResult::new(loop_index, upload, object_size);

        let download = self
            .runner
            .run(Phase::Download {
                duration,
                key_space,
            })
            .await?;
        let download = LoopResult::new(loop_index, download, object_size);

        let delete = self.runner.run(Phase::Delete { key_space }).await?;
        let delete = LoopResult::new(loop_index, delete, object_size);

        // Only complete iterations are reported.
        for result in [&upload, &download, &delete] {
            self.sink.emit(&result.to_string()).await;
        }

        Ok(LoopReport {
            upload,
            download,
            delete,
        })
    }
}
