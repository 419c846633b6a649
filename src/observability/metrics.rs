//! Metrics collection and exposition.
//!
//! # Metrics
//! - `synapse_requests_total` (counter): proxied requests by method, status, backend
//! - `synapse_request_duration_seconds` (histogram): end-to-end latency
//! - `synapse_backend_health` (gauge): 1=healthy, 0=unhealthy, per backend
//! - `synapse_healthy_backends` (gauge): size of the current healthy set
//! - `synapse_healthy_set_changes_total` (counter): healthy set replacements
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    counter!(
        "synapse_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string(),
    )
    .increment(1);
    histogram!("synapse_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("synapse_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_healthy_set(size: usize, changed: bool) {
    gauge!("synapse_healthy_backends").set(size as f64);
    if changed {
        counter!("synapse_healthy_set_changes_total").increment(1);
    }
}
