//! # Utility Functions
//!
//! Helpers shared by the benchmark driver and the binary: run identifiers,
//! human-readable formatting for log output, and validation of run parameters.
//!
//! ## Usage Examples
//!
//! ```rust
//! use round_bench::utils::*;
//! use std::time::Duration;
//!
//! # fn main() -> anyhow::Result<()> {
//! assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
//! assert_eq!(format_op_rate(15500.0), "15.50K ops/s");
//! validate_threads(4)?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::time::Duration;
use uuid::Uuid;

/// Generate a unique identifier for a run
///
/// Used for the default base filename so that two runs sharing an output
/// folder never collide on the description file.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Convert nanoseconds to a human-readable duration string
///
/// ```rust
/// # use round_bench::utils::format_duration_ns;
/// assert_eq!(format_duration_ns(500), "500ns");
/// assert_eq!(format_duration_ns(1500), "1.50μs");
/// ```
pub fn format_duration_ns(ns: u64) -> String {
    format_duration(Duration::from_nanos(ns))
}

/// Format a duration in a human-readable way
///
/// ## Unit Selection Logic
///
/// - **Nanoseconds**: < 1,000 ns (e.g., "500ns")
/// - **Microseconds**: < 1,000,000 ns (e.g., "1.50μs")
/// - **Milliseconds**: < 1,000,000,000 ns (e.g., "25.75ms")
/// - **Seconds**: < 60 seconds (e.g., "5.25s")
/// - **Minutes and Hours**: longer durations (e.g., "5m 30s", "2h 15m 30s")
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format an operation rate
///
/// ```rust
/// # use round_bench::utils::format_op_rate;
/// assert_eq!(format_op_rate(750.0), "750 ops/s");
/// assert_eq!(format_op_rate(2300000.0), "2.30M ops/s");
/// ```
pub fn format_op_rate(ops_per_second: f64) -> String {
    if ops_per_second < 1000.0 {
        format!("{:.0} ops/s", ops_per_second)
    } else if ops_per_second < 1_000_000.0 {
        format!("{:.2}K ops/s", ops_per_second / 1000.0)
    } else {
        format!("{:.2}M ops/s", ops_per_second / 1_000_000.0)
    }
}

/// Validate the number of worker threads
///
/// Zero workers would produce empty rounds; more than 1024 is almost
/// certainly a typo and would mostly measure scheduler contention.
pub fn validate_threads(threads: usize) -> Result<()> {
    if threads == 0 {
        anyhow::bail!("Thread count cannot be zero");
    }
    if threads > 1024 {
        anyhow::bail!("Thread count {} is too high (maximum 1024)", threads);
    }
    Ok(())
}

/// Validate the per-round operation count and the key space
pub fn validate_workload(ops_per_thread: usize, key_space: u64) -> Result<()> {
    if ops_per_thread == 0 {
        anyhow::bail!("Operations per thread cannot be zero");
    }
    if key_space == 0 {
        anyhow::bail!("Key space cannot be empty");
    }
    Ok(())
}

/// Number of logical CPU cores available to the process
pub fn get_cpu_cores() -> usize {
    num_cpus::get()
}

/// Default worker count: one per core, capped at 8
pub fn get_recommended_threads() -> usize {
    get_cpu_cores().min(8)
}
