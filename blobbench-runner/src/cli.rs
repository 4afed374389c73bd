//! Command line entry point of the `blobbench` binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use yansi::Paint;

use crate::config::{BenchmarkConfig, Config, Overrides};
use crate::observability;
use crate::orchestrator::Benchmark;

/// Upload, download and delete throughput benchmark for object storage.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// storage endpoint uri, such as `file:///tmp/bench` or `mem://bench`
    #[argh(option, short = 's')]
    storage_uri: Option<String>,

    /// container used for testing
    #[argh(option, short = 'b')]
    container: Option<String>,

    /// duration of each timed phase in seconds
    #[argh(option, short = 'd')]
    duration: Option<u64>,

    /// number of concurrent workers, up to 256
    #[argh(option, short = 't')]
    threads: Option<usize>,

    /// number of times to repeat the benchmark
    #[argh(option, short = 'l')]
    loops: Option<u32>,

    /// size of objects in bytes with postfix K, M and G
    #[argh(option, short = 'z')]
    size: Option<String>,

    /// print the version and exit
    #[argh(switch, short = 'V')]
    version: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            storage_uri: self.storage_uri.clone(),
            container: self.container.clone(),
            duration: self.duration.map(Duration::from_secs),
            threads: self.threads,
            loops: self.loops,
            object_size: self.size.clone(),
        }
    }
}

/// Bootstrap the runtime and execute the benchmark.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("blobbench {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    println!(
        "{} {}",
        "blobbench".bold(),
        env!("CARGO_PKG_VERSION").dim()
    );

    let config = Config::load(args.config.as_deref(), args.overrides())
        .and_then(Config::validate)
        .context("invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("bench-rt")
        .enable_all()
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing();
    tracing::debug!(?config);

    runtime.block_on(run(config))
}

async fn run(config: BenchmarkConfig) -> Result<()> {
    let benchmark = Benchmark::connect(config)?;
    match benchmark.run().await {
        Ok(reports) => {
            tracing::info!(loops = reports.len(), "benchmark finished");
            Ok(())
        }
        Err(error) => {
            tracing::error!(error = &error as &dyn std::error::Error, "benchmark aborted");
            Err(error.into())
        }
    }
}
