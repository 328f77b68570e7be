//! # Round Bench - Main Entry Point
//!
//! 1. **Initialize logging**: colored terminal output, optional log file
//! 2. **Parse arguments**: command-line configuration
//! 3. **Create the collector**: output folder and description file
//! 4. **Run rounds**: workers record, the log grows by one block per round
//!
//! ## Error Handling
//!
//! A collector that cannot be created (most often because the description
//! file already exists) ends the process with exit status 255. Every other
//! failure is reported through `anyhow` and exits with status 1.

use anyhow::Result;
use clap::Parser;
use round_bench::{
    benchmark::{BenchmarkConfig, BenchmarkRunner, KvOperation},
    cli::Args,
    collector::MeasurementCollector,
    defaults::FATAL_EXIT_CODE,
    logging::init_logging,
};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so the file writer flushes on exit
    let log_guard = init_logging(args.verbose, args.log_file.as_deref())?;

    info!("Starting Round Bench {}", round_bench::VERSION);
    info!("Configuration: {:?}", args);

    let config = BenchmarkConfig::from(&args);
    config.validate()?;

    let mut collector =
        match MeasurementCollector::new(config.collector_config()?, &KvOperation::names()) {
            Ok(collector) => collector,
            Err(e) if e.is_fatal() => {
                error!("{}", e);
                error!("exit...");
                // process::exit skips destructors; flush the log file first
                drop(log_guard);
                std::process::exit(FATAL_EXIT_CODE);
            }
            Err(e) => return Err(e.into()),
        };

    let runner = BenchmarkRunner::new(config);
    let summary = runner.run(&mut collector)?;

    info!(
        "Round Bench completed: {} rounds, {} operations, stats in {:?}",
        summary.rounds, summary.total_ops, summary.log_path
    );
    Ok(())
}
