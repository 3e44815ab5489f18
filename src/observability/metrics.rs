//! Metrics collection and exposition.
//!
//! # Metrics
//! - `traced_server_requests_total` (counter): requests by method, status
//! - `traced_server_request_duration_seconds` (histogram): handler latency
//! - `apm_transactions_total` (counter): finished transactions by category
//! - `apm_transaction_duration_seconds` (histogram): transaction durations
//! - `apm_segments_total` (counter): finished segments
//!
//! Recording is a no-op until a recorder is installed, so tests need no setup.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::apm::TransactionCategory;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "traced_server_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("traced_server_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_transaction(category: TransactionCategory, duration: Duration) {
    counter!("apm_transactions_total", "category" => category.as_str()).increment(1);
    histogram!("apm_transaction_duration_seconds", "category" => category.as_str())
        .record(duration.as_secs_f64());
}

pub fn record_segment() {
    counter!("apm_segments_total").increment(1);
}
