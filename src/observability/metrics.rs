//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_batches_total` (counter): batch calls by outcome
//! - `gateway_batch_items` (histogram): items per batch
//! - `gateway_batch_duration_seconds` (histogram): end-to-end batch latency
//! - `gateway_items_total` (counter): item results by status
//!
//! # Design Decisions
//! - Updates go through the `metrics` facade and are cheap no-ops until an
//!   exporter is installed
//! - Prometheus exposition is optional and runs on its own address

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to start metrics endpoint");
        }
    }
}

/// Record one completed batch call.
pub fn record_batch(outcome: &'static str, items: usize) {
    metrics::counter!("gateway_batches_total", "outcome" => outcome).increment(1);
    metrics::histogram!("gateway_batch_items").record(items as f64);
}
