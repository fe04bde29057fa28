//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{increment, increment_rejected, record_latency, CounterMetric, LatencyMetric};

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::TelemetryConfig;

/// Initialize logging and, when a port is configured, the metrics exporter
///
/// Both are process-global, so this can only succeed once. Must be called
/// from within a Tokio runtime when `metrics_port` is set.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, LogFormat::from_json_flag(config.json_logs))?;

    if let Some(port) = config.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("failed to start Prometheus exporter")?;
        tracing::info!(port, "Prometheus exporter listening");
    }

    Ok(())
}
