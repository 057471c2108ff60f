//! Rendering of finalised run statistics

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{DriftHistogram, RunStats};
use crate::units::{format_secs, format_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum StatsFormat {
    #[default]
    Text,
    Json,
}

pub struct StatsReport<'a> {
    stats: &'a RunStats,
    target_rate: Option<u64>,
}

impl<'a> StatsReport<'a> {
    pub fn new(stats: &'a RunStats, target_rate: Option<u64>) -> Self {
        Self { stats, target_rate }
    }

    pub fn render(&self, format: StatsFormat) -> Result<String, serde_json::Error> {
        match format {
            StatsFormat::Text => Ok(self.to_string()),
            StatsFormat::Json => serde_json::to_string_pretty(self.stats),
        }
    }
}

impl fmt::Display for StatsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        let samples = s.overruns + s.underruns + s.perfect;
        let percent = |n: u64| {
            if samples > 0 {
                100.0 * n as f64 / samples as f64
            } else {
                0.0
            }
        };

        writeln!(f, "Data transferred:    {}", format_size(s.total_bytes as f64))?;
        writeln!(f, "Duration:            {} ({:.3} s)", format_secs(s.duration_secs), s.duration_secs)?;
        if let Some(target) = self.target_rate {
            writeln!(f, "Target rate:         {}/s", format_size(target as f64))?;
        }
        writeln!(f, "Average rate:        {}/s", format_size(s.average_rate()))?;
        if let (Some(min), Some(max)) = (s.rate_min, s.rate_max) {
            writeln!(f, "Minimum rate:        {}/s", format_size(min))?;
            writeln!(f, "Maximum rate:        {}/s", format_size(max))?;
        }
        writeln!(f, "Reads:               {}", s.reads)?;
        writeln!(f, "Writes:              {}", s.writes)?;
        if s.read_errors_skipped > 0 {
            writeln!(f, "Read errors skipped: {}", s.read_errors_skipped)?;
        }
        writeln!(f, "Delays:              {}", s.delays)?;
        if s.underrun_warnings > 0 {
            writeln!(f, "Underrun warnings:   {}", s.underrun_warnings)?;
        }
        writeln!(f, "Overruns:            {:.2}%", percent(s.overruns))?;
        writeln!(f, "Underruns:           {:.2}%", percent(s.underruns))?;
        writeln!(f, "Perfect:             {:.2}%", percent(s.perfect))?;
        writeln!(f, "Buffer reallocs:     {}", s.reallocs)?;
        writeln!(f, "Minimum buffer size: {}", format_size(s.io_size_min as f64))?;
        writeln!(f, "Maximum buffer size: {}", format_size(s.io_size_max as f64))?;

        let total = s.drift.total();
        if total > 0 {
            writeln!(f, "Drift from target rate (%):")?;
            let mut lower = 0.0;
            for (i, &count) in s.drift.buckets().iter().enumerate() {
                let share = 100.0 * count as f64 / total as f64;
                match DriftHistogram::boundary(i) {
                    Some(upper) => {
                        writeln!(f, "  {:9.3} - {:9.3}: {:6.2}%", lower, upper, share)?;
                        lower = upper;
                    }
                    None => writeln!(f, "  {:9.3} +          : {:6.2}%", lower, share)?,
                }
            }
        }
        Ok(())
    }
}
