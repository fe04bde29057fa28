//! Prometheus metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use std::time::Duration;

/// Counters labelled by instrument
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Sample stored in a window
    SamplesAccepted,
    /// Alert passed the cooldown gate
    AlertsTriggered,
    /// Breach discarded while cooling down
    AlertsSuppressed,
    /// Sink failed or timed out
    SinkFailures,
    /// News lookup failed or timed out
    NewsFailures,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::SamplesAccepted => "sentinel_samples_accepted_total",
            CounterMetric::AlertsTriggered => "sentinel_alerts_triggered_total",
            CounterMetric::AlertsSuppressed => "sentinel_alerts_suppressed_total",
            CounterMetric::SinkFailures => "sentinel_sink_failures_total",
            CounterMetric::NewsFailures => "sentinel_news_failures_total",
        }
    }
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full alert dispatch, news lookup included
    Dispatch,
    /// News context lookup
    NewsLookup,
}

impl LatencyMetric {
    fn name(self) -> &'static str {
        match self {
            LatencyMetric::Dispatch => "sentinel_dispatch_latency_ms",
            LatencyMetric::NewsLookup => "sentinel_news_lookup_latency_ms",
        }
    }
}

pub fn increment(metric: CounterMetric, instrument: &str) {
    ::metrics::counter!(metric.name(), "instrument" => instrument.to_string()).increment(1);
}

/// Count a sample dropped before reaching a window
pub fn increment_rejected(reason: &'static str) {
    ::metrics::counter!("sentinel_samples_rejected_total", "reason" => reason).increment(1);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    ::metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
    tracing::trace!(
        metric = metric.name(),
        value_ms = duration.as_millis() as u64,
        "Recording latency"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_unique() {
        let mut names: Vec<&str> = [
            CounterMetric::SamplesAccepted,
            CounterMetric::AlertsTriggered,
            CounterMetric::AlertsSuppressed,
            CounterMetric::SinkFailures,
            CounterMetric::NewsFailures,
        ]
        .iter()
        .map(|m| m.name())
        .chain([LatencyMetric::Dispatch, LatencyMetric::NewsLookup].iter().map(|m| m.name()))
        .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        increment(CounterMetric::SamplesAccepted, "AAPL");
        increment_rejected("invalid_sample");
        record_latency(LatencyMetric::Dispatch, Duration::from_millis(3));
    }
}
