//! Run statistics
//!
//! Counters accumulated by the transfer loop and rendered once at exit.

pub mod report;
pub mod types;

pub use report::{StatsFormat, StatsReport};
pub use types::{DriftHistogram, RunStats, DRIFT_BUCKETS, DRIFT_FIRST_BOUNDARY};
