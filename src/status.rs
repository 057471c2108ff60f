//! Process exit statuses

use std::fmt;

use crate::buffer::BufferError;
use crate::cli::SetupError;
use crate::control::SignalError;
use crate::transfer::{ConfigError, TransferError};

/// Exit status categories, one integer per failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Success = 0,
    BadOption = 1,
    FileError = 2,
    DelayError = 3,
    TimeError = 4,
    SignalError = 5,
    ReadError = 6,
    WriteError = 7,
    AllocationError = 8,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitStatus::Success => "success",
            ExitStatus::BadOption => "bad option",
            ExitStatus::FileError => "file error",
            ExitStatus::DelayError => "delay error",
            ExitStatus::TimeError => "time error",
            ExitStatus::SignalError => "signal error",
            ExitStatus::ReadError => "read error",
            ExitStatus::WriteError => "write error",
            ExitStatus::AllocationError => "allocation error",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

impl From<&TransferError> for ExitStatus {
    fn from(err: &TransferError) -> Self {
        match err {
            TransferError::Read(_) => ExitStatus::ReadError,
            TransferError::Write { .. } => ExitStatus::WriteError,
            TransferError::Delay(_) => ExitStatus::DelayError,
            TransferError::Time(_) => ExitStatus::TimeError,
            TransferError::Allocation(_) => ExitStatus::AllocationError,
        }
    }
}

impl From<&ConfigError> for ExitStatus {
    fn from(_: &ConfigError) -> Self {
        ExitStatus::BadOption
    }
}

impl From<&SignalError> for ExitStatus {
    fn from(_: &SignalError) -> Self {
        ExitStatus::SignalError
    }
}

impl From<&BufferError> for ExitStatus {
    fn from(_: &BufferError) -> Self {
        ExitStatus::AllocationError
    }
}

/// The first categorised cause in the chain decides the status. Anything
/// uncategorised is reported as a generic failure.
impl From<&anyhow::Error> for ExitStatus {
    fn from(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<TransferError>() {
                    Some(ExitStatus::from(e))
                } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
                    Some(ExitStatus::from(e))
                } else if let Some(e) = cause.downcast_ref::<SetupError>() {
                    Some(ExitStatus::from(e))
                } else if let Some(e) = cause.downcast_ref::<SignalError>() {
                    Some(ExitStatus::from(e))
                } else {
                    cause.downcast_ref::<BufferError>().map(ExitStatus::from)
                }
            })
            .unwrap_or(ExitStatus::BadOption)
    }
}

impl From<&SetupError> for ExitStatus {
    fn from(err: &SetupError) -> Self {
        match err {
            SetupError::File { .. } => ExitStatus::FileError,
            SetupError::Signal(e) => e.into(),
        }
    }
}
