//! Startup orchestration.
//!
//! Order: config is already validated, then metrics, agent, and the listener
//! last so traffic only arrives once everything else is ready. Any error is
//! fatal.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ListenerConfig, ObservabilityConfig};
use crate::observability::metrics;

/// Error type for startup operations.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid address '{0}'")]
    Address(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Bind the TCP listener for the configured address.
pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|_| StartupError::Address(config.bind_address.clone()))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listening for connections");
    }
    Ok(listener)
}

/// Start the Prometheus endpoint when enabled.
pub fn start_metrics(config: &ObservabilityConfig) -> Result<(), StartupError> {
    if !config.metrics_enabled {
        return Ok(());
    }
    let addr: SocketAddr = config
        .metrics_address
        .parse()
        .map_err(|_| StartupError::Address(config.metrics_address.clone()))?;
    metrics::init_metrics(addr)?;
    Ok(())
}

/// Replace the port of a `host:port` bind address.
pub fn override_port(bind_address: &str, port: u16) -> Result<String, StartupError> {
    let mut addr: SocketAddr = bind_address
        .parse()
        .map_err(|_| StartupError::Address(bind_address.to_string()))?;
    addr.set_port(port);
    Ok(addr.to_string())
}
