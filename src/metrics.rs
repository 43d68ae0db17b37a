//! Prometheus metrics for request latency and data-source health.
//!
//! This module provides metrics for:
//! - Snapshot build latency (fetch + parse + model)
//! - HTTP request latency per endpoint
//! - Not-found responses by reason
//! - Data-source failures

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Snapshot build latency metric name.
pub const METRIC_SNAPSHOT_BUILD_LATENCY: &str = "snapshot_build_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Not-found responses counter metric name.
pub const METRIC_NOT_FOUND: &str = "not_found_total";
/// Data-source failures counter metric name.
pub const METRIC_SOURCE_FAILURES: &str = "source_failures_total";

/// Install the Prometheus recorder and register metric descriptions.
/// Call this once at startup.
pub fn init_metrics() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_histogram!(
        METRIC_SNAPSHOT_BUILD_LATENCY,
        "Time to fetch and build a case snapshot in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(
        METRIC_NOT_FOUND,
        "Total number of not-found responses, by reason"
    );
    describe_counter!(
        METRIC_SOURCE_FAILURES,
        "Total number of data-source failures"
    );

    debug!("Metrics initialized");
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment not-found counter.
pub fn inc_not_found(reason: &'static str) {
    counter!(METRIC_NOT_FOUND, "reason" => reason).increment(1);
}

/// Increment data-source failures counter.
pub fn inc_source_failures() {
    counter!(METRIC_SOURCE_FAILURES).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for snapshot builds.
pub fn timer_snapshot_build() -> LatencyTimer {
    LatencyTimer::new(METRIC_SNAPSHOT_BUILD_LATENCY)
}
