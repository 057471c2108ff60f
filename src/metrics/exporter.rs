//! Prometheus metrics exporter
//!
//! Exposes the transfer metrics over HTTP for Prometheus scraping. The
//! exporter runs on its own background thread and never touches the
//! transfer loop.

use crate::metrics::recorder::init_metrics;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

static EXPORTER_STARTED: AtomicBool = AtomicBool::new(false);

/// Metrics server configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics server
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}

impl MetricsConfig {
    /// Create a new config with custom address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self { listen_addr: addr }
    }
}

/// Errors that can occur during metrics setup
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to setup metrics: {0}")]
    SetupFailed(String),

    #[error("Metrics already initialized")]
    AlreadyInitialized,
}

/// Install the Prometheus recorder and start its HTTP listener.
///
/// Can only be called once per process.
pub fn start_metrics_server(config: MetricsConfig) -> Result<(), MetricsError> {
    if EXPORTER_STARTED.swap(true, Ordering::SeqCst) {
        return Err(MetricsError::AlreadyInitialized);
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::SetupFailed(e.to_string()))?;

    init_metrics();
    tracing::info!(addr = %config.listen_addr, "metrics exporter listening");
    Ok(())
}
