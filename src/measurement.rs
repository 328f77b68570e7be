//! # Per-Category Measurement
//!
//! A `Measurement` accumulates timing samples for one named category, split
//! into hits (the timed operation succeeded) and misses (it failed). Miss
//! tracking is optional and fixed when the measurement is built.
//!
//! ## Concurrency
//!
//! `record` takes `&self` and may be called from any number of threads at
//! once. Every counter is its own atomic, updated with a single
//! read-modify-write (`fetch_add`, `fetch_min`, `fetch_max`), so final values
//! after all recorders finish are exact. Fields are not updated together as a
//! unit: a snapshot taken while recorders are running can see a count and an
//! accumulated time that reflect different numbers of samples.
//!
//! The percentile estimator of each outcome sits behind its own mutex, held
//! only for the single `record` call into the estimator.
//!
//! `reset_measurement` takes `&mut self`, so it cannot run while any recorder
//! still holds a shared reference.

use crate::error::CollectorError;
use crate::percentile::PercentileEstimator;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Suffix appended to the name on miss rows.
pub const MISS_SUFFIX: &str = "(miss)";

/// Classification of one timed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Hit,
    Miss,
}

impl Outcome {
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            Outcome::Hit
        } else {
            Outcome::Miss
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Hit => f.pad("hit"),
            Outcome::Miss => f.pad("miss"),
        }
    }
}

/// Point-in-time copy of one outcome's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSnapshot {
    pub count: u64,
    pub accumulated: u64,
    pub best: u64,
    pub worst: u64,
}

impl OutcomeSnapshot {
    /// Integer average in the unit of the recorded samples. `None` without samples.
    ///
    /// Kept within `best..=worst`; this only matters once the accumulated
    /// total has saturated.
    pub fn average(&self) -> Option<u64> {
        if self.count == 0 {
            None
        } else {
            Some((self.accumulated / self.count).max(self.best).min(self.worst))
        }
    }
}

/// Counters and estimator for one outcome.
#[derive(Debug)]
struct OutcomeStats {
    count: AtomicU64,
    accumulated: AtomicU64,
    best: AtomicU64,
    worst: AtomicU64,
    percentile: Mutex<PercentileEstimator>,
}

impl OutcomeStats {
    fn new(percentiles: &[f64]) -> Result<Self, CollectorError> {
        Ok(Self {
            count: AtomicU64::new(0),
            accumulated: AtomicU64::new(0),
            best: AtomicU64::new(u64::MAX),
            worst: AtomicU64::new(0),
            percentile: Mutex::new(PercentileEstimator::new(percentiles)?),
        })
    }

    fn record(&self, elapsed: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        // saturating, not wrapping
        let _ = self
            .accumulated
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |acc| {
                Some(acc.saturating_add(elapsed))
            });
        self.best.fetch_min(elapsed, Ordering::Relaxed);
        self.worst.fetch_max(elapsed, Ordering::Relaxed);

        self.percentile.lock().record(elapsed);
    }

    fn reset(&mut self) {
        *self.count.get_mut() = 0;
        *self.accumulated.get_mut() = 0;
        *self.best.get_mut() = u64::MAX;
        *self.worst.get_mut() = 0;
        self.percentile.get_mut().delete_values();
    }

    fn snapshot(&self) -> OutcomeSnapshot {
        OutcomeSnapshot {
            count: self.count.load(Ordering::Relaxed),
            accumulated: self.accumulated.load(Ordering::Relaxed),
            best: self.best.load(Ordering::Relaxed),
            worst: self.worst.load(Ordering::Relaxed),
        }
    }

    /// `label,count,best,worst,average,<percentiles>\n`, or nothing without samples.
    fn render(&self, label: &str, delim: char) -> String {
        let snap = self.snapshot();
        let average = match snap.average() {
            Some(average) => average,
            None => return String::new(),
        };

        let mut out = String::new();
        for field in [
            label.to_string(),
            snap.count.to_string(),
            snap.best.to_string(),
            snap.worst.to_string(),
            average.to_string(),
        ] {
            out.push_str(&field);
            out.push(delim);
        }
        out.push_str(&self.percentile.lock().to_csv(delim));
        out.push('\n');
        out
    }
}

/// Timing statistics for one named category.
#[derive(Debug)]
pub struct Measurement {
    name: String,
    hit: OutcomeStats,
    miss: Option<OutcomeStats>,
}

impl Measurement {
    /// Build a measurement reporting `percentiles` for each outcome. Miss
    /// samples are dropped unless `collect_miss` is set.
    pub fn new(name: &str, collect_miss: bool, percentiles: &[f64]) -> Result<Self, CollectorError> {
        let miss = if collect_miss {
            Some(OutcomeStats::new(percentiles)?)
        } else {
            None
        };

        Ok(Self {
            name: name.to_string(),
            hit: OutcomeStats::new(percentiles)?,
            miss,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collects_miss(&self) -> bool {
        self.miss.is_some()
    }

    /// Record one sample of `elapsed` nanoseconds. A miss is silently dropped
    /// when miss collection is disabled.
    pub fn record(&self, ok: bool, elapsed: u64) {
        if let Some(stats) = self.stats(Outcome::from_ok(ok)) {
            stats.record(elapsed);
        }
    }

    /// Record a sample measured as a `Duration`.
    pub fn record_duration(&self, ok: bool, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.record(ok, nanos);
    }

    /// Restore every counter to its initial value and clear both estimators.
    pub fn reset_measurement(&mut self) {
        self.hit.reset();
        if let Some(miss) = &mut self.miss {
            miss.reset();
        }
    }

    /// Current counters for `outcome`; `None` for misses when they are not collected.
    pub fn snapshot(&self, outcome: Outcome) -> Option<OutcomeSnapshot> {
        self.stats(outcome).map(OutcomeStats::snapshot)
    }

    /// CSV row for `outcome`, or an empty string when it has no samples.
    pub fn stats_csv(&self, outcome: Outcome, delim: char) -> String {
        match outcome {
            Outcome::Hit => self.hit.render(&self.name, delim),
            Outcome::Miss => match &self.miss {
                Some(miss) => miss.render(&format!("{}{}", self.name, MISS_SUFFIX), delim),
                None => String::new(),
            },
        }
    }

    /// Header line matching the rows produced by [`stats_csv`](Self::stats_csv).
    pub fn csv_header(&self, delim: char) -> String {
        let mut out = String::new();
        for column in ["name", "operation", "best", "worst", "average"] {
            out.push_str(column);
            out.push(delim);
        }
        out.push_str(&self.hit.percentile.lock().generate_csv_header(delim));
        out.push('\n');
        out
    }

    fn stats(&self, outcome: Outcome) -> Option<&OutcomeStats> {
        match outcome {
            Outcome::Hit => Some(&self.hit),
            Outcome::Miss => self.miss.as_ref(),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stats_csv(Outcome::Hit, ','))?;
        write!(f, "{}", self.stats_csv(Outcome::Miss, ','))
    }
}
