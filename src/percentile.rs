//! Latency distribution for a single outcome stream.
//!
//! `PercentileEstimator` wraps an HDR histogram and renders the configured
//! percentiles as a CSV fragment. It is not synchronised; `Measurement` keeps
//! each estimator behind its own mutex.

use crate::error::CollectorError;
use hdrhistogram::Histogram;
use tracing::debug;

/// Significant figures kept by the histogram.
const SIGNIFICANT_FIGURES: u8 = 3;

/// HDR-histogram backed percentile estimator.
#[derive(Debug, Clone)]
pub struct PercentileEstimator {
    histogram: Histogram<u64>,
    percentiles: Vec<f64>,
    // exact largest sample; the histogram only keeps bucket bounds
    max_recorded: u64,
}

impl PercentileEstimator {
    /// Create an estimator reporting `percentiles`, in the given order.
    pub fn new(percentiles: &[f64]) -> Result<Self, CollectorError> {
        validate_percentiles(percentiles)?;

        // Starts tiny and grows on `record`; saturating_record never grows it
        let histogram = Histogram::<u64>::new(SIGNIFICANT_FIGURES)?;

        Ok(Self {
            histogram,
            percentiles: percentiles.to_vec(),
            max_recorded: 0,
        })
    }

    /// Add a sample. The histogram resizes to fit it; only values it cannot
    /// grow to cover are clamped to the highest trackable value.
    pub fn record(&mut self, value: u64) {
        if let Err(e) = self.histogram.record(value) {
            debug!("Clamping {} ns sample into histogram: {:?}", value, e);
            self.histogram.saturating_record(value);
        }
        self.max_recorded = self.max_recorded.max(value);
    }

    /// Drop all recorded samples.
    pub fn delete_values(&mut self) {
        self.histogram.reset();
        self.max_recorded = 0;
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    /// Value at `percentile`, or 0 when nothing has been recorded.
    ///
    /// Never exceeds the largest recorded sample, so a row's percentiles stay
    /// at or below its `worst` column.
    pub fn value_at(&self, percentile: f64) -> u64 {
        if self.histogram.len() == 0 {
            return 0;
        }
        self.histogram
            .value_at_percentile(percentile)
            .min(self.max_recorded)
    }

    /// Render the configured percentiles, `delim` separated, no trailing newline.
    pub fn to_csv(&self, delim: char) -> String {
        let mut out = String::new();
        for (i, &p) in self.percentiles.iter().enumerate() {
            if i > 0 {
                out.push(delim);
            }
            out.push_str(&self.value_at(p).to_string());
        }
        out
    }

    /// Column names matching [`to_csv`](Self::to_csv), e.g. `p50,p99.9`.
    pub fn generate_csv_header(&self, delim: char) -> String {
        let mut out = String::new();
        for (i, p) in self.percentiles.iter().enumerate() {
            if i > 0 {
                out.push(delim);
            }
            out.push('p');
            out.push_str(&p.to_string());
        }
        out
    }
}

fn validate_percentiles(percentiles: &[f64]) -> Result<(), CollectorError> {
    if percentiles.is_empty() {
        return Err(CollectorError::InvalidPercentile(
            "at least one percentile is required".to_string(),
        ));
    }

    if let Some(p) = percentiles
        .iter()
        .find(|p| !p.is_finite() || **p <= 0.0 || **p > 100.0)
    {
        return Err(CollectorError::InvalidPercentile(format!(
            "{} is outside (0, 100]",
            p
        )));
    }

    Ok(())
}
