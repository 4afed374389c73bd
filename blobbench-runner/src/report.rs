//! Throughput metrics and the report output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bytesize::ByteSize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::phase::{PhaseKind, PhaseOutcome};

/// Metrics of one phase in one loop iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopResult {
    /// The 1-based loop iteration.
    pub loop_index: u32,
    /// The measured phase.
    pub kind: PhaseKind,
    /// Time from phase start until the last worker exited.
    pub elapsed: Duration,
    /// Number of processed objects.
    pub objects: u64,
    /// Size of every object.
    pub object_size: ByteSize,
    /// Number of slowdown events.
    pub slowdowns: u64,
}

impl LoopResult {
    /// Derives the metrics from a phase outcome.
    pub fn new(loop_index: u32, outcome: PhaseOutcome, object_size: ByteSize) -> Self {
        Self {
            loop_index,
            kind: outcome.kind,
            elapsed: outcome.elapsed,
            objects: outcome.objects,
            object_size,
            slowdowns: outcome.slowdowns,
        }
    }

    /// Transferred bytes per second.
    pub fn bytes_per_sec(&self) -> f64 {
        self.per_sec(self.objects as f64 * self.object_size.as_u64() as f64)
    }

    /// Completed operations per second.
    pub fn ops_per_sec(&self) -> f64 {
        self.per_sec(self.objects as f64)
    }

    fn per_sec(&self, amount: f64) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { amount / secs } else { 0.0 }
    }
}

impl fmt::Display for LoopResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs_f64();
        match self.kind {
            PhaseKind::Upload | PhaseKind::Download => write!(
                f,
                "Loop {}: {} time {secs:.1} secs, objects = {}, speed = {}/sec, {:.1} operations/sec. Slowdowns = {}",
                self.loop_index,
                self.kind.label(),
                self.objects,
                ByteSize::b(self.bytes_per_sec() as u64),
                self.ops_per_sec(),
                self.slowdowns,
            ),
            PhaseKind::Delete => write!(
                f,
                "Loop {}: {} time {secs:.1} secs, {} objects, {:.1} deletes/sec. Slowdowns = {}",
                self.loop_index,
                self.kind.label(),
                self.objects,
                self.ops_per_sec(),
                self.slowdowns,
            ),
        }
    }
}

/// All phase results of one loop iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopReport {
    /// Results of the upload phase.
    pub upload: LoopResult,
    /// Results of the download phase.
    pub download: LoopResult,
    /// Results of the delete phase.
    pub delete: LoopResult,
}

/// Writes report lines to stdout and appends them to a log file.
#[derive(Clone, Debug, Default)]
pub struct ReportSink {
    log_file: Option<PathBuf>,
}

impl ReportSink {
    /// Creates a sink that appends to the given file, if any.
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    /// Prints the line and appends it with a timestamp to the log file.
    ///
    /// Failing to write the log file does not abort the run.
    pub async fn emit(&self, line: &str) {
        println!("{line}");

        let Some(path) = &self.log_file else {
            return;
        };
        let entry = format!(
            "{}: {line}\n",
            humantime::format_rfc3339_seconds(SystemTime::now())
        );
        if let Err(error) = append(path, &entry).await {
            tracing::warn!(
                error = &error as &dyn std::error::Error,
                path = %path.display(),
                "failed to write report log"
            );
        }
    }
}

async fn append(path: &Path, entry: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(entry.as_bytes()).await?;
    file.flush().await
}
