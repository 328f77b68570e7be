//! # Round Bench Library
//!
//! Concurrent latency collection for benchmarking runs that are split into
//! rounds. Worker threads record timed operations as hits or misses under a
//! fixed set of named measurements; between rounds the controller resets the
//! counters and appends each round's statistics to a CSV log.
//!
//! ## Architecture Overview
//!
//! - `measurement`: per-category atomic counters plus a percentile estimator
//!   per outcome
//! - `collector`: the ordered set of measurements, round counter and log files
//! - `percentile`: HDR-histogram backed percentile estimator
//! - `benchmark`: a key/value workload that drives a collector round by round
//! - `bitmask`, `bytes`: bit-mask and big-endian integer helpers
//! - `cli`, `logging`, `utils`: command line, tracing setup and formatting
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use round_bench::{CollectorConfig, MeasurementCollector};
//! use std::time::Instant;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = CollectorConfig::new("results", "run1", "cache test\n").collect_miss(true);
//!     let mut collector = MeasurementCollector::new(config, &["get", "put"])?;
//!
//!     for round in 1..=3 {
//!         if round > 1 {
//!             collector.new_round();
//!         }
//!         let get = collector.measurement("get").expect("declared above");
//!         let start = Instant::now();
//!         let found = true; // ... run the operation ...
//!         get.record_duration(found, start.elapsed());
//!
//!         collector.write_stats("latency", ',')?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## File Layout
//!
//! ```text
//! results/run1.desc            description, written once
//! results/run1_latency.log     name,operation,best,worst,average,p50,...
//!                              1_get,2,100,300,200,...
//!                              2_get,5,90,410,180,...
//! ```

/// Benchmark driver: key/value workload, worker threads and round loop
pub mod benchmark;

/// Bit-mask construction and non-overlapping allocation
pub mod bitmask;

/// Fixed-width big-endian integer encoding
pub mod bytes;

/// Command-line interface
pub mod cli;

/// Measurement set, round lifecycle and CSV log files
pub mod collector;

/// Error types
pub mod error;

pub mod logging;

/// Per-category hit/miss statistics
pub mod measurement;

/// Percentile estimator backing each outcome stream
pub mod percentile;

pub mod utils;

pub use benchmark::{BenchmarkConfig, BenchmarkRunner, KvOperation, RunSummary};
pub use cli::Args;
pub use collector::{CollectorConfig, MeasurementCollector};
pub use error::{CollectorError, MaskError};
pub use measurement::{Measurement, Outcome, OutcomeSnapshot};
pub use percentile::PercentileEstimator;

/// The current version of the crate, recorded in every run description
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Folder receiving description and log files
    pub const OUTPUT_FOLDER: &str = "bench_results";

    /// Log file suffix: `<base>_latency.log`
    pub const FILE_EXTENSION: &str = "latency";

    pub const DELIMITER: char = ',';

    /// Percentiles reported per outcome
    pub const PERCENTILES: &[f64] = &[50.0, 90.0, 95.0, 99.0, 99.9];

    /// Operations each worker performs per round
    pub const OPS_PER_THREAD: usize = 100_000;

    pub const ROUNDS: u64 = 3;

    /// Keys are drawn from `0..KEY_SPACE`
    pub const KEY_SPACE: u64 = 10_000;

    /// Bytes per stored value
    pub const VALUE_SIZE: usize = 64;

    /// Exit status when the run cannot be set up (e.g. the description file
    /// already exists)
    pub const FATAL_EXIT_CODE: i32 = 255;
}
