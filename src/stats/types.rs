use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of drift buckets; the last one is open-ended
pub const DRIFT_BUCKETS: usize = 16;

/// Upper bound of the first drift bucket, in percent
pub const DRIFT_FIRST_BOUNDARY: f64 = 0.125;

/// Histogram of rate drift with exponentially doubling bucket boundaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftHistogram {
    buckets: [u64; DRIFT_BUCKETS],
    total: u64,
}

impl DriftHistogram {
    /// Upper bound (exclusive) of bucket `index`, `None` for the last bucket
    pub fn boundary(index: usize) -> Option<f64> {
        if index + 1 >= DRIFT_BUCKETS {
            None
        } else {
            Some(DRIFT_FIRST_BOUNDARY * (1u64 << index) as f64)
        }
    }

    pub fn bucket_index(percent: f64) -> usize {
        (0..DRIFT_BUCKETS)
            .find(|&i| Self::boundary(i).map_or(true, |bound| percent < bound))
            .unwrap_or(DRIFT_BUCKETS - 1)
    }

    pub fn record(&mut self, percent: f64) {
        self.buckets[Self::bucket_index(percent)] += 1;
        self.total += 1;
    }

    pub fn buckets(&self) -> &[u64; DRIFT_BUCKETS] {
        &self.buckets
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub reads: u64,
    pub writes: u64,
    pub overruns: u64,
    pub underruns: u64,
    pub perfect: u64,
    pub delays: u64,
    pub reallocs: u64,
    pub read_errors_skipped: u64,
    /// Times the sustained-underrun warning fired
    pub underrun_warnings: u64,
    pub total_bytes: u64,
    pub rate_min: Option<f64>,
    pub rate_max: Option<f64>,
    pub io_size_min: usize,
    pub io_size_max: usize,
    pub drift: DriftHistogram,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
}

impl RunStats {
    pub fn new(io_size: usize) -> Self {
        Self {
            reads: 0,
            writes: 0,
            overruns: 0,
            underruns: 0,
            perfect: 0,
            delays: 0,
            reallocs: 0,
            read_errors_skipped: 0,
            underrun_warnings: 0,
            total_bytes: 0,
            rate_min: None,
            rate_max: None,
            io_size_min: io_size,
            io_size_max: io_size,
            drift: DriftHistogram::default(),
            started_at: Utc::now(),
            finished_at: None,
            duration_secs: 0.0,
        }
    }

    pub fn observe_rate(&mut self, rate: f64) {
        self.rate_min = Some(self.rate_min.map_or(rate, |min| min.min(rate)));
        self.rate_max = Some(self.rate_max.map_or(rate, |max| max.max(rate)));
    }

    pub fn observe_io_size(&mut self, io_size: usize) {
        self.io_size_min = self.io_size_min.min(io_size);
        self.io_size_max = self.io_size_max.max(io_size);
    }

    /// Stamp the end of the run. Later calls are ignored.
    pub fn finalize(&mut self, duration_secs: f64) {
        if self.finished_at.is_some() {
            return;
        }
        self.finished_at = Some(Utc::now());
        self.duration_secs = duration_secs.max(0.0);
    }

    pub fn average_rate(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.total_bytes as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}
