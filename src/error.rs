//! Error types returned by the collector and the bit-mask helpers.
//!
//! The library reports failures as typed errors; the binary and the
//! benchmark driver wrap them with `anyhow` context. Construction failures
//! (`CollectorError::Description`) are meant to end the run, and the binary
//! exits with [`crate::defaults::FATAL_EXIT_CODE`] when it sees one.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a collector or persisting its statistics.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The description file could not be created or written. A pre-existing
    /// file means another run already used this base path.
    #[error("cannot create description file {path:?}: {source}")]
    Description {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A per-extension log file could not be created, opened or written.
    #[error("cannot write log file {path:?}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("at least one measurement name is required")]
    NoMeasurements,

    #[error("measurement name {0:?} is declared more than once")]
    DuplicateMeasurement(String),

    /// Empty names and names with line breaks cannot form a log row.
    #[error("measurement name {0:?} is empty or contains a line break")]
    InvalidName(String),

    #[error("invalid percentile list: {0}")]
    InvalidPercentile(String),

    #[error("cannot create percentile histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),
}

impl CollectorError {
    /// Whether the run must stop. Only a description file that cannot be
    /// created is fatal; configuration mistakes and log write failures are
    /// ordinary errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectorError::Description { .. })
    }
}

/// Errors raised while building bit masks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    #[error("bit mask of {bits} bits at offset {offset} overflows a {width}-bit integer")]
    Overflow { bits: u32, offset: u32, width: u32 },

    #[error("overlapping masks: allocated = {allocated:#018X}, requested = {requested:#018X}")]
    Overlap { allocated: u64, requested: u64 },

    #[error("mask region of {0} bytes is not supported (1 to 8 bytes)")]
    InvalidWidth(u32),
}
