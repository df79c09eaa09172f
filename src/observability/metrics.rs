//! Metrics collection and exposition.
//!
//! # Metrics
//! - `static_files_served_total` (counter): files served, by `encoding`
//! - `static_files_rejected_total` (counter): failed requests, by `status`

use std::net::SocketAddr;

use axum::http::StatusCode;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::file::Encoding;

pub fn record_served(encoding: Option<&Encoding>) {
    let label = encoding.map_or_else(|| "identity".to_string(), |e| e.as_str().to_string());
    counter!("static_files_served_total", "encoding" => label).increment(1);
}

pub fn record_rejected(status: StatusCode) {
    counter!("static_files_rejected_total", "status" => status.as_u16().to_string()).increment(1);
}

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
