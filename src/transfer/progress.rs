//! Verbose progress line

use std::fmt;

use crate::units::{format_secs, format_size};

/// One snapshot of transfer progress, rendered on a single status line
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub current_rate: f64,
    /// `+`, `-`, `0`, or a blank without rate control
    pub indicator: char,
    pub total_bytes: u64,
    pub elapsed: f64,
    pub io_size: usize,
    pub total_size: Option<u64>,
}

impl Progress {
    /// Percentage done and estimated seconds remaining, when the total
    /// size is known and some data has moved.
    pub fn completion(&self) -> Option<(f64, f64)> {
        let total_size = self.total_size? as f64;
        if total_size <= 0.0 || self.total_bytes == 0 {
            return None;
        }
        let done = self.total_bytes as f64;
        let percent = 100.0 * done / total_size;
        let eta = self.elapsed * (total_size / done) - self.elapsed;
        Some((percent, eta.max(0.0)))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate: {}/S, Adj: {}, Total: {}, Dur: {:.1} S, ",
            format_size(self.current_rate),
            self.indicator,
            format_size(self.total_bytes as f64),
            self.elapsed
        )?;
        match self.completion() {
            Some((percent, eta)) => write!(f, "{:5.1}%, ETA: {}  ", percent, format_secs(eta)),
            None => write!(f, "Buf: {}  ", format_size(self.io_size as f64)),
        }
    }
}
