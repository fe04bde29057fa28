//! Replay of recorded price updates

use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;

use super::IngestionSource;
use crate::engine::{IngestHandle, ShutdownSignal};
use crate::movement::PriceUpdate;

/// Emits a fixed sequence of updates in order, then finishes
///
/// Files are JSON lines, one [`PriceUpdate`] per line:
/// `{"instrument_id":"AAPL","price":187.5,"observed_at":"2024-01-09T15:00:00Z"}`
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    updates: Vec<PriceUpdate>,
}

impl ReplaySource {
    pub fn from_updates(updates: Vec<PriceUpdate>) -> Self {
        Self { updates }
    }

    /// Read a JSON-lines file; malformed lines are skipped with a warning
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    fn parse(content: &str) -> Self {
        let mut updates = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<PriceUpdate>(line) {
                Ok(update) => updates.push(update),
                Err(e) => tracing::warn!(line = index + 1, error = %e, "Skipping malformed replay line"),
            }
        }
        Self { updates }
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[async_trait]
impl IngestionSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn run(&self, queue: IngestHandle, mut shutdown: ShutdownSignal) -> anyhow::Result<()> {
        let mut sent = 0usize;
        for update in &self.updates {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                result = queue.enqueue(update.clone()) => {
                    if result.is_err() {
                        break;
                    }
                    sent += 1;
                }
            }
        }
        tracing::info!(sent, total = self.updates.len(), "Replay finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{IngestionRouter, Shutdown};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_parse_skips_bad_lines() {
        let content = r#"
# recorded 2024-01-09
{"instrument_id":"AAPL","price":100,"observed_at":"2024-01-09T15:00:00Z"}
{"instrument_id":"AAPL","price":"oops","observed_at":"2024-01-09T15:01:00Z"}
not json at all
{"instrument_id":"AAPL","price":"101.5","observed_at":"2024-01-09T15:02:00Z"}
"#;
        let source = ReplaySource::parse(content);
        assert_eq!(source.len(), 2);
        assert_eq!(source.updates[1].price, dec!(101.5));
        assert_eq!(
            source.updates[1].observed_at,
            Utc.with_ymd_and_hms(2024, 1, 9, 15, 2, 0).unwrap()
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"instrument_id":"^GSPC","price":5000,"observed_at":"2024-01-09T15:00:00Z"}}"#
        )
        .unwrap();

        let source = ReplaySource::from_file(file.path()).unwrap();
        assert_eq!(source.len(), 1);
        assert!(ReplaySource::from_file("/nonexistent/replay.jsonl").is_err());
    }

    #[tokio::test]
    async fn test_run_preserves_order() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 9, 15, 0, 0).unwrap();
        let updates: Vec<_> = (0..5)
            .map(|i| PriceUpdate::new("AAPL", dec!(100) + rust_decimal::Decimal::from(i), t0))
            .collect();
        let source = ReplaySource::from_updates(updates.clone());
        let (handle, mut router) = IngestionRouter::channel(16);
        let shutdown = Shutdown::new();

        source.run(handle, shutdown.subscribe()).await.unwrap();

        let mut received = Vec::new();
        while let Some(update) = router.next_update().await {
            received.push(update);
        }
        assert_eq!(received, updates);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let t0 = Utc::now();
        let source = ReplaySource::from_updates(vec![PriceUpdate::new("AAPL", dec!(1), t0); 10]);
        let (handle, _router) = IngestionRouter::channel(16);
        let shutdown = Shutdown::new();
        shutdown.trigger();

        assert!(source.run(handle.clone(), shutdown.subscribe()).await.is_ok());
        assert!(!handle.is_closed());
    }
}
