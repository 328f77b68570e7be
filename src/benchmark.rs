//! # Benchmark Driver
//!
//! Drives a `MeasurementCollector` the way a benchmarking program does: worker
//! threads hammer a shared in-memory key/value store, every operation is timed
//! and recorded under the operation's name, and between rounds the driver waits
//! for all workers, advances the round and appends the stats to the CSV log.
//!
//! ## Round Lifecycle
//!
//! 1. **Reset**: `new_round` (from round 2 on) clears every measurement
//! 2. **Measure**: `threads` scoped workers start together on a barrier
//! 3. **Join**: all workers finish; no recorder is in flight any more
//! 4. **Persist**: `write_stats` appends this round's block to the log
//!
//! Workers only borrow the collector for the duration of step 2 and 3, so the
//! mutable borrow taken by `new_round` in step 1 is the quiescence point.

use crate::{
    cli::Args,
    collector::{CollectorConfig, MeasurementCollector},
    measurement::{Measurement, Outcome},
    utils::{format_duration_ns, format_op_rate, generate_run_id, validate_threads, validate_workload},
};
use anyhow::{anyhow, Context, Result};
use core_affinity::CoreId;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Operations offered by the key/value workload. Each one is a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOperation {
    Get,
    Put,
    Remove,
}

impl KvOperation {
    pub const ALL: [KvOperation; 3] = [KvOperation::Get, KvOperation::Put, KvOperation::Remove];

    pub fn name(self) -> &'static str {
        match self {
            KvOperation::Get => "get",
            KvOperation::Put => "put",
            KvOperation::Remove => "remove",
        }
    }

    /// Measurement names in declaration order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|op| op.name()).collect()
    }
}

impl fmt::Display for KvOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Shared in-memory store the workers operate on.
pub struct KvWorkload {
    store: RwLock<HashMap<u64, Vec<u8>>>,
    key_space: u64,
    value_size: usize,
}

impl KvWorkload {
    pub fn new(key_space: u64, value_size: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            key_space,
            value_size,
        }
    }

    /// Store a value under every even key so that roughly half of the
    /// lookups and removals hit.
    pub fn prefill(&self) {
        let value = vec![0u8; self.value_size];
        let mut store = self.store.write();
        for key in (0..self.key_space).step_by(2) {
            store.insert(key, value.clone());
        }
        debug!("Prefilled {} keys", store.len());
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    pub fn random_key<R: Rng>(&self, rng: &mut R) -> u64 {
        rng.gen_range(0..self.key_space)
    }

    pub fn random_value<R: Rng>(&self, rng: &mut R) -> Vec<u8> {
        let mut value = vec![0u8; self.value_size];
        rng.fill(&mut value[..]);
        value
    }

    /// Run one operation. Returns whether it succeeded: `get` and `remove`
    /// fail on a missing key, `put` always succeeds.
    pub fn execute(&self, op: KvOperation, key: u64, value: &[u8]) -> bool {
        match op {
            KvOperation::Get => self.store.read().contains_key(&key),
            KvOperation::Put => {
                self.store.write().insert(key, value.to_vec());
                true
            }
            KvOperation::Remove => self.store.write().remove(&key).is_some(),
        }
    }
}

/// Benchmark configuration
///
/// Built from the parsed command line. Serialised into the run's description
/// file so every log can be traced back to the settings that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub threads: usize,
    pub ops_per_thread: usize,
    pub rounds: u64,
    pub key_space: u64,
    pub value_size: usize,
    pub collect_miss: bool,
    pub percentiles: Vec<f64>,
    pub file_extension: String,
    pub delimiter: char,
    pub folder: PathBuf,
    pub base_filename: String,
    pub pin_cores: bool,
}

/// Contents of the `.desc` file.
#[derive(Debug, Serialize)]
struct RunDescription<'a> {
    version: &'static str,
    started_at: chrono::DateTime<chrono::Utc>,
    measurements: Vec<&'static str>,
    config: &'a BenchmarkConfig,
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        validate_threads(self.threads)?;
        validate_workload(self.ops_per_thread, self.key_space)?;
        if self.rounds == 0 {
            anyhow::bail!("At least one round is required");
        }
        if self.file_extension.is_empty() {
            anyhow::bail!("File extension cannot be empty");
        }
        Ok(())
    }

    /// JSON description line written once per run.
    pub fn description(&self) -> Result<String> {
        let description = RunDescription {
            version: crate::VERSION,
            started_at: chrono::Utc::now(),
            measurements: KvOperation::names(),
            config: self,
        };
        let mut line = serde_json::to_string(&description)
            .context("Failed to serialise the run description")?;
        line.push('\n');
        Ok(line)
    }

    pub fn collector_config(&self) -> Result<CollectorConfig> {
        Ok(
            CollectorConfig::new(&self.folder, &self.base_filename, &self.description()?)
                .collect_miss(self.collect_miss)
                .percentiles(self.percentiles.clone()),
        )
    }
}

impl From<&Args> for BenchmarkConfig {
    fn from(args: &Args) -> Self {
        Self {
            threads: args.threads,
            ops_per_thread: args.ops_per_thread,
            rounds: args.rounds,
            key_space: args.key_space,
            value_size: args.value_size,
            collect_miss: args.collect_miss,
            percentiles: args.percentiles.clone(),
            file_extension: args.extension.clone(),
            delimiter: args.delimiter,
            folder: args.folder.clone(),
            base_filename: args
                .base_filename
                .clone()
                .unwrap_or_else(|| format!("run_{}", generate_run_id())),
            pin_cores: args.pin_cores,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rounds: u64,
    pub total_ops: u64,
    pub log_path: PathBuf,
}

/// Runs the key/value workload round by round against a collector.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run every round and append each one to the log.
    ///
    /// The collector must be fresh (round 1); its measurements must include
    /// every [`KvOperation`] name.
    pub fn run(&self, collector: &mut MeasurementCollector) -> Result<RunSummary> {
        self.config.validate()?;
        if collector.round() != 1 {
            anyhow::bail!(
                "Collector is already at round {}; a run needs a fresh collector",
                collector.round()
            );
        }

        let workload = KvWorkload::new(self.config.key_space, self.config.value_size);
        workload.prefill();

        let core_ids = if self.config.pin_cores {
            let ids = core_affinity::get_core_ids().unwrap_or_default();
            if ids.is_empty() {
                warn!("Core pinning requested but no core ids are available; running unpinned");
            }
            ids
        } else {
            Vec::new()
        };

        info!(
            "Running {} rounds: {} threads x {} ops",
            self.config.rounds, self.config.threads, self.config.ops_per_thread
        );

        let mut total_ops = 0u64;
        let mut log_path = None;
        for round in 1..=self.config.rounds {
            if round > 1 {
                collector.new_round();
            }

            let elapsed = self.run_round(collector, &workload, &core_ids)?;

            let path = collector
                .write_stats(&self.config.file_extension, self.config.delimiter)
                .with_context(|| format!("Failed to write stats for round {}", round))?;

            let round_ops = recorded_ops(collector);
            total_ops += round_ops;
            self.log_round_summary(collector, round_ops, elapsed);
            log_path = Some(path);
        }

        let log_path = log_path.ok_or_else(|| anyhow!("No round was executed"))?;
        info!("Stats written to {:?}", log_path);

        Ok(RunSummary {
            rounds: self.config.rounds,
            total_ops,
            log_path,
        })
    }

    /// One measurement round: spawn, release together, join.
    fn run_round(
        &self,
        collector: &MeasurementCollector,
        workload: &KvWorkload,
        core_ids: &[CoreId],
    ) -> Result<Duration> {
        let targets = KvOperation::ALL
            .iter()
            .map(|&op| {
                collector
                    .measurement(op.name())
                    .map(|m| (op, m))
                    .ok_or_else(|| anyhow!("Collector has no measurement named {:?}", op.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        let barrier = Barrier::new(self.config.threads);
        let started = Instant::now();

        thread::scope(|scope| -> Result<()> {
            let handles: Vec<_> = (0..self.config.threads)
                .map(|worker_id| {
                    let targets = &targets;
                    let barrier = &barrier;
                    let core = core_ids.get(worker_id % core_ids.len().max(1)).copied();
                    scope.spawn(move || {
                        if let Some(core) = core {
                            if !core_affinity::set_for_current(core) {
                                warn!("Worker {} could not be pinned to core {:?}", worker_id, core);
                            }
                        }
                        barrier.wait();
                        run_worker(workload, targets, self.config.ops_per_thread);
                    })
                })
                .collect();

            for (worker_id, handle) in handles.into_iter().enumerate() {
                handle
                    .join()
                    .map_err(|_| anyhow!("Worker {} panicked", worker_id))?;
            }
            Ok(())
        })?;

        Ok(started.elapsed())
    }

    fn log_round_summary(&self, collector: &MeasurementCollector, round_ops: u64, elapsed: Duration) {
        let rate = round_ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            "Round {} done: {} ops in {:?} ({})",
            collector.round(),
            round_ops,
            elapsed,
            format_op_rate(rate)
        );

        for m in collector.measurements() {
            for outcome in [Outcome::Hit, Outcome::Miss] {
                let snap = match m.snapshot(outcome) {
                    Some(snap) => snap,
                    None => continue,
                };
                if let Some(average) = snap.average() {
                    info!(
                        "  {:<8} {:<4} count={:<9} best={:<10} worst={:<10} avg={}",
                        m.name(),
                        outcome,
                        snap.count,
                        format_duration_ns(snap.best),
                        format_duration_ns(snap.worst),
                        format_duration_ns(average)
                    );
                }
            }
        }
    }
}

fn run_worker(workload: &KvWorkload, targets: &[(KvOperation, &Measurement)], ops: usize) {
    let mut rng = rand::thread_rng();
    let value = workload.random_value(&mut rng);

    for _ in 0..ops {
        let (op, measurement) = targets[rng.gen_range(0..targets.len())];
        let key = workload.random_key(&mut rng);

        let start = Instant::now();
        let ok = workload.execute(op, key, &value);
        measurement.record_duration(ok, start.elapsed());
    }
}

/// Samples recorded this round, misses included when collected.
fn recorded_ops(collector: &MeasurementCollector) -> u64 {
    collector
        .measurements()
        .flat_map(|m| [m.snapshot(Outcome::Hit), m.snapshot(Outcome::Miss)])
        .flatten()
        .map(|snap| snap.count)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, collect_miss: bool) -> BenchmarkConfig {
        BenchmarkConfig {
            threads: 4,
            ops_per_thread: 500,
            rounds: 2,
            key_space: 64,
            value_size: 16,
            collect_miss,
            percentiles: vec![50.0, 99.0],
            file_extension: "latency".to_string(),
            delimiter: ',',
            folder: dir.path().to_path_buf(),
            base_filename: "bench".to_string(),
            pin_cores: false,
        }
    }

    #[test]
    fn test_workload_operations() {
        let workload = KvWorkload::new(8, 4);
        assert!(workload.is_empty());
        assert!(!workload.execute(KvOperation::Get, 1, &[]));
        assert!(workload.execute(KvOperation::Put, 1, &[1, 2, 3, 4]));
        assert!(workload.execute(KvOperation::Get, 1, &[]));
        assert!(workload.execute(KvOperation::Remove, 1, &[]));
        assert!(!workload.execute(KvOperation::Remove, 1, &[]));
    }

    #[test]
    fn test_prefill_even_keys() {
        let workload = KvWorkload::new(10, 4);
        workload.prefill();
        assert_eq!(workload.len(), 5);
        assert!(workload.execute(KvOperation::Get, 4, &[]));
        assert!(!workload.execute(KvOperation::Get, 5, &[]));
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(KvOperation::names(), vec!["get", "put", "remove"]);
        assert_eq!(KvOperation::Remove.to_string(), "remove");
    }

    #[test]
    fn test_config_validation() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, false);
        assert!(config.validate().is_ok());

        config.rounds = 0;
        assert!(config.validate().is_err());
        config.rounds = 1;
        config.threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_description_is_json() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, true);
        let line = config.description().unwrap();
        assert!(line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["config"]["threads"], 4);
        assert_eq!(value["config"]["collect_miss"], true);
        assert_eq!(value["measurements"][1], "put");
    }

    #[test]
    fn test_run_records_every_operation() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, true);
        let mut collector =
            MeasurementCollector::new(config.collector_config().unwrap(), &KvOperation::names())
                .unwrap();

        let summary = BenchmarkRunner::new(config).run(&mut collector).unwrap();

        assert_eq!(summary.rounds, 2);
        // With misses collected every operation lands in exactly one counter
        assert_eq!(summary.total_ops, 2 * 4 * 500);
        assert_eq!(collector.round(), 2);
        assert!(summary.log_path.is_file());
    }

    #[test]
    fn test_run_rejects_used_collector() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, false);
        let mut collector =
            MeasurementCollector::new(config.collector_config().unwrap(), &KvOperation::names())
                .unwrap();
        collector.new_round();

        assert!(BenchmarkRunner::new(config).run(&mut collector).is_err());
    }

    #[test]
    fn test_run_requires_operation_measurements() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, false);
        let mut collector =
            MeasurementCollector::new(config.collector_config().unwrap(), &["get"]).unwrap();

        assert!(BenchmarkRunner::new(config).run(&mut collector).is_err());
    }
}
