use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// Benchmark crates whose logs are captured at full verbosity.
const CRATE_NAMES: &[&str] = &["blobbench", "blobbench_runner", "blobbench_storage"];

/// Initialize the logger for testing.
///
/// Logs go to the output capture of the Rust test runner. Unless `RUST_LOG` is set, only the
/// benchmark crates are logged, everything else is limited to errors. Calling this more than once
/// is fine, only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// blobbench_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        CRATE_NAMES
            .iter()
            .filter_map(|name| format!("{name}=TRACE").parse::<Directive>().ok())
            .fold(EnvFilter::new("ERROR"), EnvFilter::add_directive)
    });

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .without_time()
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
