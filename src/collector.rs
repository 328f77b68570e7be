//! # Measurement Collector
//!
//! Owns the fixed, ordered set of measurements for one benchmarking run and
//! persists their statistics as append-only CSV logs, one block per round.
//!
//! ## File Layout
//!
//! - `<folder>/<base>.desc`: the run description, written once at construction
//! - `<folder>/<base>_<extension>.log`: header line on round 1, then one data
//!   block per `write_stats` call
//!
//! Each data line is `<round>_<name>[(miss)],<count>,<best>,<worst>,<average>,<percentiles>`.
//!
//! ## Round Lifecycle
//!
//! `new_round` takes `&mut self`. Workers record through shared references,
//! so a round cannot change while any of them is still running.

use crate::error::CollectorError;
use crate::measurement::{Measurement, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings for one collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub folder: PathBuf,
    pub base_filename: String,
    pub description: String,
    pub collect_miss: bool,
    pub percentiles: Vec<f64>,
}

impl CollectorConfig {
    pub fn new<P: AsRef<Path>>(folder: P, base_filename: &str, description: &str) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
            base_filename: base_filename.to_string(),
            description: description.to_string(),
            collect_miss: false,
            percentiles: crate::defaults::PERCENTILES.to_vec(),
        }
    }

    pub fn collect_miss(mut self, collect_miss: bool) -> Self {
        self.collect_miss = collect_miss;
        self
    }

    pub fn percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.percentiles = percentiles;
        self
    }
}

/// Coordinator for a run's measurements, rounds and log files.
#[derive(Debug)]
pub struct MeasurementCollector {
    measurements: Vec<Measurement>,
    round: u64,
    base_path: PathBuf,
    collect_miss: bool,
}

impl MeasurementCollector {
    /// Create the output folder, write the description file and build one
    /// measurement per name, in order.
    ///
    /// Names must be non-empty, unique and free of line breaks. They should
    /// also avoid the delimiter later passed to `write_stats`, or the log
    /// rows gain extra columns.
    ///
    /// Fails with [`CollectorError::Description`] if the description file
    /// already exists or cannot be written; the run must not continue then.
    pub fn new(config: CollectorConfig, names: &[&str]) -> Result<Self, CollectorError> {
        if names.is_empty() {
            return Err(CollectorError::NoMeasurements);
        }

        if let Some(bad) = names
            .iter()
            .find(|name| name.is_empty() || name.contains(|c: char| c == '\n' || c == '\r'))
        {
            return Err(CollectorError::InvalidName(bad.to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|name| !seen.insert(**name)) {
            return Err(CollectorError::DuplicateMeasurement(dup.to_string()));
        }

        let measurements = names
            .iter()
            .map(|name| Measurement::new(name, config.collect_miss, &config.percentiles))
            .collect::<Result<Vec<_>, _>>()?;

        let base_path = config.folder.join(&config.base_filename);
        let desc_path = path_with_suffix(&base_path, ".desc");

        write_description(&config.folder, &desc_path, &config.description).map_err(|source| {
            CollectorError::Description {
                path: desc_path.clone(),
                source,
            }
        })?;

        info!(
            "Collector ready: {} measurements, description at {:?}",
            measurements.len(),
            desc_path
        );

        Ok(Self {
            measurements,
            round: 1,
            base_path,
            collect_miss: config.collect_miss,
        })
    }

    /// Look up a measurement by name.
    pub fn measurement(&self, name: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.name() == name)
    }

    /// All measurements in declaration order.
    pub fn measurements(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter()
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn collect_miss(&self) -> bool {
        self.collect_miss
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn description_path(&self) -> PathBuf {
        path_with_suffix(&self.base_path, ".desc")
    }

    pub fn log_path(&self, file_extension: &str) -> PathBuf {
        path_with_suffix(&self.base_path, &format!("_{}.log", file_extension))
    }

    /// Reset every measurement and advance the round counter by one.
    pub fn new_round(&mut self) {
        for m in &mut self.measurements {
            m.reset_measurement();
        }
        self.round += 1;
        debug!("Advanced to round {}", self.round);
    }

    /// Data block for the current round: every non-empty hit row, followed by
    /// the measurement's miss row when misses are collected.
    pub fn csv_stats(&self, delim: char) -> String {
        let mut out = String::new();
        for m in &self.measurements {
            push_row(&mut out, self.round, &m.stats_csv(Outcome::Hit, delim));
            if self.collect_miss {
                push_row(&mut out, self.round, &m.stats_csv(Outcome::Miss, delim));
            }
        }
        out
    }

    /// Append the current round's statistics to `<base>_<file_extension>.log`.
    ///
    /// On round 1 the file is created (it must not exist yet) and the header is
    /// written first. Later rounds append to the existing file. Returns the log
    /// path. The collector's state is not modified, so a failed call can be retried.
    pub fn write_stats(&self, file_extension: &str, delim: char) -> Result<PathBuf, CollectorError> {
        let path = self.log_path(file_extension);
        let first_round = self.round == 1;

        let mut payload = String::new();
        if first_round {
            // The name list is never empty, see `new`
            if let Some(first) = self.measurements.first() {
                payload.push_str(&first.csv_header(delim));
            }
        }
        payload.push_str(&self.csv_stats(delim));

        let mut options = OpenOptions::new();
        if first_round {
            options.write(true).create_new(true);
        } else {
            options.append(true);
        }

        let result = options.open(&path).and_then(|mut file| {
            file.write_all(payload.as_bytes())?;
            file.flush()
        });
        result.map_err(|source| CollectorError::LogFile {
            path: path.clone(),
            source,
        })?;

        debug!(
            "Wrote round {} stats ({} bytes) to {:?}",
            self.round,
            payload.len(),
            path
        );
        Ok(path)
    }
}

fn push_row(out: &mut String, round: u64, row: &str) {
    if !row.is_empty() {
        out.push_str(&round.to_string());
        out.push('_');
        out.push_str(row);
    }
}

fn path_with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

fn write_description(folder: &Path, desc_path: &Path, description: &str) -> std::io::Result<()> {
    fs::create_dir_all(folder)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(desc_path)?;
    file.write_all(description.as_bytes())?;
    file.flush()
}
