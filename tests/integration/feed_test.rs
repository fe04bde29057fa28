//! Replay through the ingestion router

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stock_sentinel::alert::{Alert, AlertDispatcher, AlertSink};
use stock_sentinel::config::{DisplayThresholds, InstrumentConfig, TriggerConfig};
use stock_sentinel::engine::{IngestionRouter, MovementEngine, RouterStats, Shutdown};
use stock_sentinel::feed::{IngestionSource, ReplaySource};
use stock_sentinel::movement::{InstrumentClass, PriceUpdate, Thresholds};

#[derive(Default)]
struct CountingSink(AtomicUsize);

#[async_trait]
impl AlertSink for CountingSink {
    fn name(&self) -> &str {
        "counting"
    }

    async fn notify(&self, _alert: &Alert) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn engine(sink: Arc<CountingSink>) -> MovementEngine {
    let mut thresholds = HashMap::new();
    thresholds.insert(InstrumentClass::Stock, Thresholds::new(dec!(2), dec!(-2)));
    thresholds.insert(InstrumentClass::Index, Thresholds::new(dec!(1), dec!(-1)));
    let trigger = TriggerConfig {
        time_window_minutes: 10,
        min_data_points: 2,
        cool_down_minutes: 5,
        thresholds,
    };
    let instruments = [("AAPL", InstrumentClass::Stock), ("^GSPC", InstrumentClass::Index)].map(|(s, class)| {
        InstrumentConfig {
            symbol: s.to_string(),
            class,
            name: None,
            alerts: DisplayThresholds::default(),
        }
    });
    let dispatcher = AlertDispatcher::new(std::time::Duration::from_secs(1)).with_sink(sink);
    MovementEngine::new(&trigger, instruments, dispatcher)
}

#[tokio::test]
async fn test_replay_file_through_router() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"instrument_id":"AAPL","price":100,"observed_at":"2024-01-09T15:00:00Z"}}
{{"instrument_id":"^GSPC","price":4800,"observed_at":"2024-01-09T15:00:00Z"}}
{{"instrument_id":"AAPL","price":103,"observed_at":"2024-01-09T15:01:00Z"}}
{{"instrument_id":"^GSPC","price":4810,"observed_at":"2024-01-09T15:01:00Z"}}
{{"instrument_id":"AAPL","price":104,"observed_at":"2024-01-09T15:02:00Z"}}
{{"instrument_id":"TSLA","price":250,"observed_at":"2024-01-09T15:02:00Z"}}
garbage line
{{"instrument_id":"^GSPC","price":4740,"observed_at":"2024-01-09T15:03:00Z"}}"#
    )
    .unwrap();

    let source = ReplaySource::from_file(file.path()).unwrap();
    assert_eq!(source.len(), 7);

    let sink = Arc::new(CountingSink::default());
    let mut engine = engine(sink.clone());
    let (handle, router) = IngestionRouter::channel(4);
    let shutdown = Shutdown::new();

    let signal = shutdown.subscribe();
    let producer = tokio::spawn(async move { source.run(handle, signal).await });
    let stats = router.run(&mut engine, shutdown.subscribe()).await;
    producer.await.unwrap().unwrap();

    // AAPL fires at 15:01 and is suppressed at 15:02; ^GSPC fires at 15:03
    assert_eq!(
        stats,
        RouterStats {
            processed: 7,
            rejected: 1,
            suppressed: 1,
            dispatched: 2,
        }
    );
    assert_eq!(sink.0.load(Ordering::SeqCst), 2);
    assert_eq!(engine.windows().len("^GSPC"), 3);
}

#[tokio::test]
async fn test_multiple_sources_share_one_queue() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 9, 15, 0, 0).unwrap();
    let stocks: Vec<_> = (0..20)
        .map(|i| PriceUpdate::new("AAPL", dec!(100), t0 + Duration::seconds(i)))
        .collect();
    let indices: Vec<_> = (0..20)
        .map(|i| PriceUpdate::new("^GSPC", dec!(4800), t0 + Duration::seconds(i)))
        .collect();

    let sink = Arc::new(CountingSink::default());
    let mut engine = engine(sink.clone());
    let (handle, router) = IngestionRouter::channel(2);
    let shutdown = Shutdown::new();

    let mut producers = Vec::new();
    for updates in [stocks, indices] {
        let source = ReplaySource::from_updates(updates);
        let queue = handle.clone();
        let signal = shutdown.subscribe();
        producers.push(tokio::spawn(async move { source.run(queue, signal).await }));
    }
    drop(handle);

    let stats = router.run(&mut engine, shutdown.subscribe()).await;
    for producer in producers {
        producer.await.unwrap().unwrap();
    }

    assert_eq!(stats.processed, 40);
    assert_eq!(stats.rejected, 0);
    assert_eq!(engine.windows().len("AAPL"), 20);
    assert_eq!(engine.windows().len("^GSPC"), 20);
    assert_eq!(sink.0.load(Ordering::SeqCst), 0);
}
