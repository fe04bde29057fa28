//! End-to-end integration tests
//!
//! Drive the public engine API through the movement scenarios an operator
//! relies on: first alert, cooldown suppression, re-arm after expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stock_sentinel::alert::{Alert, AlertDispatcher, AlertSink};
use stock_sentinel::config::{DisplayThresholds, InstrumentConfig, TriggerConfig};
use stock_sentinel::engine::{MovementEngine, Outcome};
use stock_sentinel::movement::{InstrumentClass, MovementError, PriceUpdate, Thresholds, TriggerReason};

#[derive(Default)]
struct Recorder {
    alerts: Mutex<Vec<Alert>>,
}

impl Recorder {
    fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn notify(&self, alert: &Alert) -> anyhow::Result<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

fn engine(window_minutes: u64, recorder: Arc<Recorder>) -> MovementEngine {
    let mut thresholds = HashMap::new();
    thresholds.insert(InstrumentClass::Stock, Thresholds::new(dec!(2), dec!(-2)));
    let trigger = TriggerConfig {
        time_window_minutes: window_minutes,
        min_data_points: 2,
        cool_down_minutes: 5,
        thresholds,
    };
    let aapl = InstrumentConfig {
        symbol: "AAPL".to_string(),
        class: InstrumentClass::Stock,
        name: Some("Apple Inc.".to_string()),
        alerts: DisplayThresholds::default(),
    };
    let dispatcher = AlertDispatcher::new(std::time::Duration::from_secs(1)).with_sink(recorder);
    MovementEngine::new(&trigger, vec![aapl], dispatcher)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 9, 15, 0, 0).unwrap()
}

fn at(minutes: i64, price: Decimal) -> PriceUpdate {
    PriceUpdate::new("AAPL", price, t0() + Duration::minutes(minutes))
}

#[tokio::test]
async fn test_alert_suppressed_then_rearmed() {
    let recorder = Arc::new(Recorder::default());
    let mut engine = engine(5, recorder.clone());

    assert_eq!(engine.process(at(0, dec!(100))).await.unwrap(), Outcome::Pending);

    let first = engine.process(at(1, dec!(103))).await.unwrap();
    assert!(matches!(first, Outcome::Dispatched(ref r) if r.delivered == 1));

    assert_eq!(engine.process(at(2, dec!(103.5))).await.unwrap(), Outcome::Suppressed);

    // t=0 falls out of the 5 minute window, so the base is now t=1
    let fourth = engine.process(at(6, dec!(108))).await.unwrap();
    assert!(matches!(fourth, Outcome::Dispatched(_)));

    let alerts = recorder.alerts();
    assert_eq!(alerts.len(), 2);

    assert_eq!(alerts[0].movement.base_price, dec!(100));
    assert_eq!(alerts[0].movement.percentage_change, dec!(3));
    assert_eq!(alerts[0].reason, TriggerReason::PercentageUp { threshold: dec!(2) });

    let second = &alerts[1].movement;
    assert_eq!(second.base_price, dec!(103));
    assert_eq!(second.current_price, dec!(108));
    assert_eq!(second.window_start, t0() + Duration::minutes(1));
    assert_eq!(second.percentage_change.round_dp(2), dec!(4.85));
    assert_ne!(alerts[0].id, alerts[1].id);
}

#[tokio::test]
async fn test_ten_minute_window_keeps_original_base() {
    let recorder = Arc::new(Recorder::default());
    let mut engine = engine(10, recorder.clone());

    for (minute, price) in [(0, dec!(100)), (1, dec!(103)), (2, dec!(103.5)), (6, dec!(108))] {
        engine.process(at(minute, price)).await.unwrap();
    }

    let alerts = recorder.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].movement.base_price, dec!(100));
    assert_eq!(alerts[1].movement.percentage_change, dec!(8));
    assert_eq!(engine.windows().len("AAPL"), 4);
}

#[tokio::test]
async fn test_cooldown_boundary() {
    let recorder = Arc::new(Recorder::default());
    let mut engine = engine(10, recorder.clone());
    let base = t0();

    engine.process(PriceUpdate::new("AAPL", dec!(100), base)).await.unwrap();
    engine
        .process(PriceUpdate::new("AAPL", dec!(97), base + Duration::seconds(30)))
        .await
        .unwrap();

    // One second short of the cooldown
    let early = engine
        .process(PriceUpdate::new("AAPL", dec!(96), base + Duration::seconds(329)))
        .await
        .unwrap();
    assert_eq!(early, Outcome::Suppressed);

    let late = engine
        .process(PriceUpdate::new("AAPL", dec!(95), base + Duration::seconds(331)))
        .await
        .unwrap();
    assert!(matches!(late, Outcome::Dispatched(_)));

    let alerts = recorder.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].reason, TriggerReason::PercentageDown { threshold: dec!(-2) });
}

#[tokio::test]
async fn test_rejected_samples_do_not_corrupt_window() {
    let recorder = Arc::new(Recorder::default());
    let mut engine = engine(10, recorder.clone());

    engine.process(at(0, dec!(100))).await.unwrap();
    engine.process(at(3, dec!(101))).await.unwrap();

    let err = engine.process(at(4, dec!(-5))).await.unwrap_err();
    assert!(matches!(err, MovementError::InvalidSample { .. }));

    let err = engine.process(at(2, dec!(150))).await.unwrap_err();
    assert!(matches!(err, MovementError::OutOfOrderSample { .. }));

    let snapshot = engine.windows().snapshot("AAPL");
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[1].price(), dec!(101));
    assert!(recorder.alerts().is_empty());

    let outcome = engine.process(at(5, dec!(102))).await.unwrap();
    assert!(matches!(outcome, Outcome::Dispatched(_)));
}
