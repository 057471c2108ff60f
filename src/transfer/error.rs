use thiserror::Error;

use crate::buffer::BufferError;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Read error")]
    Read(#[source] std::io::Error),

    #[error("Write error on {sink}")]
    Write {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Delay error")]
    Delay(#[source] std::io::Error),

    #[error("Time error: {0}")]
    Time(String),

    #[error(transparent)]
    Allocation(#[from] BufferError),
}

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Rate value {0} too low")]
    RateTooLow(u64),

    #[error("Must specify a data rate (-r) or no rate control (-n)")]
    MissingRate,

    #[error("Cannot combine no rate control with {0}")]
    Conflict(&'static str),

    #[error("I/O buffer size {0} out of range")]
    IoSizeOutOfRange(usize),

    #[error("Adjust shift {0} out of range (0..=16)")]
    ShiftOutOfRange(u32),

    #[error("Delay mode {0} out of range (0..=5)")]
    DelayModeOutOfRange(u8),

    #[error("Maximum transfer size must be greater than zero")]
    ZeroMaxTransfer,

    #[error("Report interval {0} must be a positive number of seconds")]
    InvalidReportInterval(f64),

    #[error("{0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
