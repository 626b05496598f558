//! Prometheus metrics setup and metric definitions

use crate::error::{AppError, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Zendesk round-trips; a 10s timeout caps the top bucket
    let buckets = vec![0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .map_err(|e| AppError::Config(format!("Failed to set histogram buckets: {}", e)))?
        .install_recorder()
        .map_err(|e| AppError::Config(format!("Failed to install Prometheus recorder: {}", e)))
}

/// Register metric descriptions and emit initial zero values so Prometheus
/// output includes HELP/TYPE lines from startup.
pub fn describe_metrics() {
    describe_counter!(
        "zendesk_auth_attempts_total",
        "Authentication attempts against Zendesk by result"
    );
    describe_counter!(
        "zendesk_api_requests_total",
        "Zendesk API requests by method and outcome"
    );
    describe_histogram!(
        "zendesk_api_request_duration_seconds",
        "Zendesk API request duration in seconds"
    );
    describe_counter!(
        "zendesk_session_operations_total",
        "Redis session store operations"
    );

    counter!("zendesk_auth_attempts_total", "result" => "success").absolute(0);
    counter!("zendesk_api_requests_total", "method" => "GET", "outcome" => "success").absolute(0);
    histogram!("zendesk_api_request_duration_seconds", "method" => "GET").record(0.0);
    counter!("zendesk_session_operations_total", "operation" => "put").absolute(0);
}
