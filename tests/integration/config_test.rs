//! Configuration loading tests

use rust_decimal_macros::dec;
use std::io::Write;

use stock_sentinel::config::{Config, ConfigError};
use stock_sentinel::movement::{InstrumentClass, Thresholds};

#[test]
fn test_config_example_parses() {
    let config = Config::parse(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.trigger.time_window_minutes, 10);
    assert_eq!(config.trigger.cool_down_minutes, 5);
    assert_eq!(
        config.trigger.thresholds[&InstrumentClass::Index],
        Thresholds::new(dec!(1), dec!(-1))
    );
    assert_eq!(config.push_symbols(), vec!["AAPL".to_string(), "NVDA".to_string()]);
    assert_eq!(config.poll_symbols(), vec!["^GSPC".to_string()]);
    assert_eq!(config.feed.backoff.max_attempts, 10);
    assert!(config.alert.sound_file.is_none());
    assert!(!config.news.enabled);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(include_str!("../../config.toml.example").as_bytes())
        .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.instruments.len(), 3);
    assert_eq!(
        config.instrument("^GSPC").and_then(|i| i.name.as_deref()),
        Some("S&P 500")
    );
}

#[test]
fn test_missing_instruments_rejected() {
    let toml = r#"
        instruments = []

        [trigger]
        time_window_minutes = 10
        min_data_points = 2
        cool_down_minutes = 5

        [trigger.thresholds.stock]
        up = 2.0
        down = -2.0
    "#;

    let err = Config::parse(toml).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::NoInstruments)
    );
}

#[test]
fn test_zero_cooldown_rejected() {
    let toml = r#"
        [trigger]
        time_window_minutes = 10
        min_data_points = 2
        cool_down_minutes = 0

        [trigger.thresholds.stock]
        up = 2.0
        down = -2.0

        [[instruments]]
        symbol = "AAPL"
    "#;

    let err = Config::parse(toml).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::ZeroValue("trigger.cool_down_minutes"))
    );
}

#[test]
fn test_unknown_class_is_a_parse_error() {
    let toml = r#"
        [trigger]
        time_window_minutes = 10
        min_data_points = 2
        cool_down_minutes = 5

        [trigger.thresholds.stock]
        up = 2.0
        down = -2.0

        [[instruments]]
        symbol = "BTC"
        class = "crypto"
    "#;

    let err = Config::parse(toml).unwrap_err();
    assert!(err.downcast_ref::<ConfigError>().is_none());
}
