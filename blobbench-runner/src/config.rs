//! Configuration for a benchmark run.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line flags
//! 2. Environment variables (prefixed with `BB__`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! The loaded [`Config`] is checked by [`Config::validate`], which yields the immutable
//! [`BenchmarkConfig`] used for the run.
//!
//! # Example
//!
//! ```yaml
//! storage_uri: file:///var/tmp/blobbench
//! container: my-container
//! duration: 30s
//! threads: 16
//! loops: 3
//! object_size: 4M
//! slowdown_threshold: 250ms
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytesize::ByteSize;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::size::{SizeError, parse_size};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "BB__";

/// Upper bound for [`Config::threads`].
pub const MAX_THREADS: usize = 256;

/// Errors detected while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be merged or parsed.
    #[error("failed to load configuration")]
    Load(#[from] Box<figment::Error>),

    /// No storage endpoint has been configured.
    #[error("missing storage uri (set `-s`, `storage_uri` or `BB__STORAGE_URI`)")]
    MissingStorageUri,

    /// The container name is empty.
    #[error("container name must not be empty")]
    EmptyContainer,

    /// The phase duration is zero.
    #[error("duration must be positive")]
    ZeroDuration,

    /// The worker count is outside of `1..=MAX_THREADS`.
    #[error("threads must be between 1 and {MAX_THREADS}, got {0}")]
    InvalidThreads(usize),

    /// The loop count is zero.
    #[error("loops must be at least 1")]
    NoLoops,

    /// The object size could not be parsed.
    #[error("invalid object size")]
    InvalidObjectSize(#[source] SizeError),
}

/// Raw benchmark configuration as merged from all sources.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Storage endpoint URI, for example `mem://bench` or `file:///tmp/bench`. Required.
    pub storage_uri: Option<String>,

    /// Name of the container that receives the benchmark objects.
    ///
    /// # Default
    ///
    /// `"blobbench-container"`
    pub container: String,

    /// Duration of the timed upload and download phases.
    ///
    /// # Default
    ///
    /// `60s`
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Number of concurrent workers per phase, at most [`MAX_THREADS`].
    ///
    /// # Default
    ///
    /// `1`
    pub threads: usize,

    /// Number of times the upload, download, delete cycle is repeated.
    ///
    /// # Default
    ///
    /// `1`
    pub loops: u32,

    /// Size of every object, with a `K`, `M` or `G` suffix.
    ///
    /// # Default
    ///
    /// `"1M"`
    pub object_size: String,

    /// File that report lines are appended to.
    ///
    /// # Default
    ///
    /// `"benchmark.log"`
    pub log_file: PathBuf,

    /// Operations slower than this are counted as slowdowns.
    ///
    /// # Default
    ///
    /// Disabled
    #[serde(with = "humantime_serde")]
    pub slowdown_threshold: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_uri: None,
            container: "blobbench-container".into(),
            duration: Duration::from_secs(60),
            threads: 1,
            loops: 1,
            object_size: "1M".into(),
            log_file: "benchmark.log".into(),
            slowdown_threshold: None,
        }
    }
}

/// Values given on the command line, overriding all other sources.
#[derive(Debug, Default, Serialize)]
#[allow(missing_docs)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "humantime_serde::option"
    )]
    pub duration: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loops: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_size: Option<String>,
}

impl Config {
    /// Loads the configuration from defaults, an optional YAML file, the environment and the
    /// given command line overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    /// Checks all settings and produces the configuration used for the run.
    pub fn validate(self) -> Result<BenchmarkConfig, ConfigError> {
        let storage_uri = match self.storage_uri {
            Some(uri) if !uri.trim().is_empty() => uri,
            _ => return Err(ConfigError::MissingStorageUri),
        };
        if self.container.is_empty() {
            return Err(ConfigError::EmptyContainer);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if !(1..=MAX_THREADS).contains(&self.threads) {
            return Err(ConfigError::InvalidThreads(self.threads));
        }
        if self.loops == 0 {
            return Err(ConfigError::NoLoops);
        }
        let object_size =
            parse_size(&self.object_size).map_err(ConfigError::InvalidObjectSize)?;

        Ok(BenchmarkConfig {
            storage_uri,
            container: self.container,
            duration: self.duration,
            threads: self.threads,
            loops: self.loops,
            object_size,
            log_file: Some(self.log_file),
            slowdown_threshold: self.slowdown_threshold,
        })
    }
}

/// Validated settings of a benchmark run.
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    /// Storage endpoint URI passed to [`blobbench_storage::connect`].
    pub storage_uri: String,
    /// Name of the container used for the run.
    pub container: String,
    /// Duration of the timed phases.
    pub duration: Duration,
    /// Number of workers, and storage handles, per phase.
    pub threads: usize,
    /// Number of loop iterations.
    pub loops: u32,
    /// Size of every uploaded object.
    pub object_size: ByteSize,
    /// File that report lines are appended to.
    pub log_file: Option<PathBuf>,
    /// Latency above which an operation counts as a slowdown.
    pub slowdown_threshold: Option<Duration>,
}

impl BenchmarkConfig {
    /// Creates a configuration with default settings for the given endpoint.
    ///
    /// No report file is written.
    pub fn new(storage_uri: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            storage_uri: storage_uri.into(),
            container: defaults.container,
            duration: defaults.duration,
            threads: defaults.threads,
            loops: defaults.loops,
            object_size: ByteSize::mib(1),
            log_file: None,
            slowdown_threshold: None,
        }
    }
}

impl fmt::Display for BenchmarkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "storage_uri={}, container={}, duration={}, threads={}, loops={}, size={}",
            self.storage_uri,
            self.container,
            humantime::format_duration(self.duration),
            self.threads,
            self.loops,
            self.object_size,
        )
    }
}
