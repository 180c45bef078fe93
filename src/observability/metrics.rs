//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_ready` (gauge): 1 after a ready sweep, 0 otherwise
//! - `service_alive` (gauge): result of the last liveness check
//! - `service_listener_errors_total` (counter): terminal listener errors by address
//! - `service_shutdown_duration_seconds` (histogram): time spent in teardown

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the process-wide Prometheus recorder once.
///
/// Returns `None` when another recorder already owns the process.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                None
            }
        })
        .clone()
}

/// The installed recorder handle, if `init_metrics` succeeded.
pub fn prometheus_handle() -> Option<PrometheusHandle> {
    PROMETHEUS.get().cloned().flatten()
}

pub fn record_readiness(ready: bool) {
    metrics::gauge!("service_ready").set(if ready { 1.0 } else { 0.0 });
}

pub fn record_liveness(alive: bool) {
    metrics::gauge!("service_alive").set(if alive { 1.0 } else { 0.0 });
}

pub fn record_listener_error(address: &str) {
    metrics::counter!("service_listener_errors_total", "address" => address.to_string())
        .increment(1);
}

pub fn record_shutdown_duration(elapsed: Duration) {
    metrics::histogram!("service_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}
