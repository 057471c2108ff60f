use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::buffer::{IO_SIZE_MAX, IO_SIZE_MIN};
use crate::delay::DelayProfile;
use crate::rate::policy::{AdjustmentPolicy, ADJUST_SHIFT_MAX};

/// Default progress report interval in seconds
pub const REPORT_INTERVAL_DEFAULT: f64 = 0.25;

/// Smallest default I/O size when derived from the rate
pub const IO_SIZE_DEFAULT_MIN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRate {
    /// Bytes per second
    Limited(u64),
    /// Copy as fast as possible, no delays or adjustments
    Unlimited,
}

impl TargetRate {
    pub fn bytes_per_sec(self) -> Option<u64> {
        match self {
            TargetRate::Limited(rate) => Some(rate),
            TargetRate::Unlimited => None,
        }
    }
}

/// Resolved settings for one transfer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub target_rate: TargetRate,
    pub io_size: usize,
    pub delay_profile: DelayProfile,
    pub policy: AdjustmentPolicy,
    pub max_trans: Option<u64>,
    pub timed_run: Option<Duration>,
    /// Expected total size, enables percentage and ETA in progress output
    pub total_size: Option<u64>,
    pub discard: bool,
    pub skip_read_errors: bool,
    pub fsync: bool,
    pub verbose: bool,
    pub report_interval: f64,
    /// Still report statistics when the run fails
    pub stats_on_error: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            target_rate: TargetRate::Unlimited,
            io_size: 4096,
            delay_profile: DelayProfile::default(),
            policy: AdjustmentPolicy::default(),
            max_trans: None,
            timed_run: None,
            total_size: None,
            discard: false,
            skip_read_errors: false,
            fsync: false,
            verbose: false,
            report_interval: REPORT_INTERVAL_DEFAULT,
            stats_on_error: false,
        }
    }
}

impl TransferConfig {
    /// Limited-rate config with the I/O size derived from the rate
    pub fn with_rate(rate: u64) -> Self {
        Self {
            target_rate: TargetRate::Limited(rate),
            io_size: Self::default_io_size(rate),
            ..Default::default()
        }
    }

    /// `rate / 32`, but never below 1 KiB and never above the maximum
    pub fn default_io_size(rate: u64) -> usize {
        let size = usize::try_from(rate / 32).unwrap_or(IO_SIZE_MAX);
        size.clamp(IO_SIZE_DEFAULT_MIN, IO_SIZE_MAX)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match self.target_rate {
            TargetRate::Limited(0) => return Err(ConfigError::RateTooLow(0)),
            TargetRate::Unlimited => {
                if self.policy.const_delay_us.is_some() {
                    return Err(ConfigError::Conflict("a constant delay"));
                }
                if self.policy.grow_on_underrun || self.policy.shrink_on_overrun {
                    return Err(ConfigError::Conflict("buffer adjustment"));
                }
                if self.policy.warn_on_underrun {
                    return Err(ConfigError::Conflict("underrun warnings"));
                }
            }
            TargetRate::Limited(_) => {}
        }
        if !(IO_SIZE_MIN..=IO_SIZE_MAX).contains(&self.io_size) {
            return Err(ConfigError::IoSizeOutOfRange(self.io_size));
        }
        if self.policy.adjust_shift > ADJUST_SHIFT_MAX {
            return Err(ConfigError::ShiftOutOfRange(self.policy.adjust_shift));
        }
        if self.max_trans == Some(0) {
            return Err(ConfigError::ZeroMaxTransfer);
        }
        if !(self.report_interval.is_finite() && self.report_interval > 0.0) {
            return Err(ConfigError::InvalidReportInterval(self.report_interval));
        }
        Ok(())
    }
}
