//! Metrics and observability module
//!
//! Live counters and gauges for a running transfer, recorded through the
//! `metrics` facade. Nothing is recorded unless an exporter is installed.
//!
//! Key metrics exposed:
//! - Bytes and cycles moved
//! - Delays taken and current delay budget
//! - Buffer reallocations and current I/O size
//! - Observed transfer rate

pub mod exporter;
pub mod recorder;

pub use exporter::{start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{record_cycle, record_delay, record_resize, record_sample, record_stop};
