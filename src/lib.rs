//! sluice: an adaptive rate-controlled byte pipe
//!
//! Copies a byte stream from a source to a sink at a target rate, steering a
//! per-cycle delay and the I/O buffer size from a running average of the
//! achieved rate.

pub mod buffer;
pub mod cli;
pub mod control;
pub mod delay;
pub mod metrics;
pub mod rate;
pub mod stats;
pub mod status;
pub mod transfer;
pub mod units;
