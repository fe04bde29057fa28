//! Alert dispatcher
//!
//! Called synchronously by the router for every trigger that passed the
//! cooldown gate. Every outbound call is bounded by a timeout so a stuck
//! sink or news lookup cannot stall ingestion. Failures are logged and
//! reported; they never undo the trigger.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use uuid::Uuid;

use super::types::{Alert, AlertError, DispatchReport, NewsItem, NewsQuery};
use super::{AlertSink, NewsContextProvider};
use crate::config::InstrumentConfig;
use crate::movement::Trigger;
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};

/// Fan-out to alert sinks with optional news enrichment
pub struct AlertDispatcher {
    sinks: Vec<Arc<dyn AlertSink>>,
    news: Option<(Arc<dyn NewsContextProvider>, Duration)>,
    sink_timeout: Duration,
}

impl AlertDispatcher {
    /// Create a dispatcher with no sinks; each sink call gets `sink_timeout`
    pub fn new(sink_timeout: Duration) -> Self {
        Self {
            sinks: Vec::new(),
            news: None,
            sink_timeout,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Look up news before delivery, giving up after `lookup_timeout`
    pub fn with_news(mut self, provider: Arc<dyn NewsContextProvider>, lookup_timeout: Duration) -> Self {
        self.news = Some((provider, lookup_timeout));
        self
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver one alert to every sink, at most once each
    pub async fn dispatch(&self, trigger: &Trigger, instrument: &InstrumentConfig) -> DispatchReport {
        let started = Instant::now();
        let alert_id = Uuid::new_v4();

        let context = self.lookup_context(alert_id, trigger, instrument).await;
        let alert = Alert {
            id: alert_id,
            instrument_id: trigger.instrument_id.clone(),
            name: instrument.name.clone(),
            class: trigger.class,
            movement: trigger.movement.clone(),
            reason: trigger.reason,
            display: instrument.alerts.clone(),
            context_requested: self.news.is_some(),
            context,
            raised_at: Utc::now(),
        };

        let mut delivered = 0;
        let mut failed = Vec::new();

        for sink in &self.sinks {
            let result = match timeout(self.sink_timeout, sink.notify(&alert)).await {
                Ok(result) => result,
                Err(_) => Err(AlertError::Timeout {
                    stage: format!("sink {}", sink.name()),
                    after: self.sink_timeout,
                }
                .into()),
            };

            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        alert_id = %alert_id,
                        instrument = %alert.instrument_id,
                        sink = sink.name(),
                        error = %e,
                        "Alert delivery failed"
                    );
                    increment(CounterMetric::SinkFailures, &alert.instrument_id);
                    failed.push(sink.name().to_string());
                }
            }
        }

        record_latency(LatencyMetric::Dispatch, started.elapsed());
        tracing::debug!(
            alert_id = %alert_id,
            instrument = %alert.instrument_id,
            delivered,
            failed = failed.len(),
            "Alert dispatched"
        );

        DispatchReport {
            alert_id,
            delivered,
            failed,
            context_items: alert.context.len(),
        }
    }

    async fn lookup_context(
        &self,
        alert_id: Uuid,
        trigger: &Trigger,
        instrument: &InstrumentConfig,
    ) -> Vec<NewsItem> {
        let Some((provider, lookup_timeout)) = &self.news else {
            return Vec::new();
        };

        let query = NewsQuery {
            instrument_id: trigger.instrument_id.clone(),
            name: instrument.name.clone(),
            class: trigger.class,
            movement: trigger.movement.clone(),
        };

        let started = Instant::now();
        let result = timeout(*lookup_timeout, provider.fetch_context(&query)).await;
        record_latency(LatencyMetric::NewsLookup, started.elapsed());

        match result {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                tracing::warn!(alert_id = %alert_id, instrument = %query.instrument_id, error = %e, "News lookup failed");
                increment(CounterMetric::NewsFailures, &query.instrument_id);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    alert_id = %alert_id,
                    instrument = %query.instrument_id,
                    timeout_ms = lookup_timeout.as_millis() as u64,
                    "News lookup timed out"
                );
                increment(CounterMetric::NewsFailures, &query.instrument_id);
                Vec::new()
            }
        }
    }
}
