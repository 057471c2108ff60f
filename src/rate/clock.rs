use std::time::{SystemTime, UNIX_EPOCH};

use crate::transfer::error::{TransferError, TransferResult};

/// Source of wall-clock time in seconds
pub trait Clock {
    fn now(&self) -> TransferResult<f64>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> TransferResult<f64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .map_err(|e| TransferError::Time(e.to_string()))
    }
}
