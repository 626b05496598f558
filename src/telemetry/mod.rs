//! Telemetry initialization: structured logging and metrics

pub mod metrics;

use crate::config::TelemetryConfig;
use crate::error::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise logging, and the Prometheus recorder when metrics are enabled.
///
/// Returns `Some(PrometheusHandle)` when metrics are enabled so the host can
/// expose a `/metrics` endpoint. Calling this twice keeps the first
/// subscriber.
pub fn init(config: &TelemetryConfig) -> Result<Option<PrometheusHandle>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zendesk_auth=info".into());

    let prometheus_handle = if config.metrics_enabled {
        let handle = metrics::install_prometheus_recorder()?;
        metrics::describe_metrics();
        Some(handle)
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if config.log_format == "json" {
        // Flatten event fields so `message` is top-level in each JSON line
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true);
        registry.with(fmt_layer).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(prometheus_handle)
}
