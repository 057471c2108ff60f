//! Run-time control shared between signal handlers and the transfer loop
//!
//! The loop is the only reader; handlers only store or flip atomics.

pub mod error;
pub mod flags;
pub mod signals;

pub use error::{SignalError, SignalResult};
pub use flags::ControlFlags;
pub use signals::install_handlers;
