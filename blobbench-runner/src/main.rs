//! Command line entry point of the benchmark.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    blobbench_runner::cli::execute()
}
