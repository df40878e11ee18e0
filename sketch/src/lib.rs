pub mod error;

use std::time::Duration;

use error::SketchError;
use hdrhistogram::Histogram;

// Samples are tracked in nanoseconds, from 1ns up to one hour.
const LOWEST_NANOS: u64 = 1;
const HIGHEST_NANOS: u64 = 3_600_000_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

/// Online latency estimator. Keeps a fixed-size HDR histogram instead of
/// every sample, so memory stays flat no matter how long a run lasts.
#[derive(Debug, Clone)]
pub struct LatencySketch {
    inner: Histogram<u64>,
}

impl LatencySketch {
    pub fn new() -> Result<Self, SketchError> {
        let inner = Histogram::new_with_bounds(LOWEST_NANOS, HIGHEST_NANOS, SIGNIFICANT_FIGURES)?;
        Ok(Self { inner })
    }

    /// Samples above the tracked range are clamped to the highest bucket.
    pub fn add_sample(&mut self, sample: Duration) {
        let nanos = u64::try_from(sample.as_nanos()).unwrap_or(u64::MAX);
        self.inner.saturating_record(nanos.max(LOWEST_NANOS));
    }

    pub fn count(&self) -> u64 {
        self.inner.len()
    }

    pub fn mean(&self) -> Duration {
        Duration::from_nanos(self.inner.mean().round() as u64)
    }

    /// `p` is a fraction in `[0, 1]`; 0.95 is the 95th percentile.
    pub fn percentile(&self, p: f64) -> Duration {
        Duration::from_nanos(self.inner.value_at_quantile(p.clamp(0.0, 1.0)))
    }
}
