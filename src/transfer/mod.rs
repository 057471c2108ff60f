//! Transfer configuration, endpoints and the adaptive copy loop

pub mod config;
pub mod error;
pub mod io;
pub mod progress;
pub mod session;

pub use config::{TargetRate, TransferConfig};
pub use error::{ConfigError, ConfigResult, TransferError, TransferResult};
pub use io::{Sink, Source, WriteOutcome};
pub use progress::Progress;
pub use session::{StopReason, TransferIo, TransferSession, TransferSummary};
