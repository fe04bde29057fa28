//! Configuration types for stock-sentinel

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::BackoffPolicy;
use crate::movement::{InstrumentClass, Thresholds};

/// Environment variable overriding `feed.api_key`
pub const FINNHUB_API_KEY_ENV: &str = "FINNHUB_API_KEY";
/// Environment variable overriding `news.api_key`
pub const NEWS_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Longest accepted window or cooldown: one leap year
pub const MAX_TRIGGER_MINUTES: u64 = 366 * 24 * 60;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub trigger: TriggerConfig,
    pub instruments: Vec<InstrumentConfig>,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Movement trigger and cooldown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    /// Sliding window length
    pub time_window_minutes: u64,
    /// Samples required before a movement is evaluated
    pub min_data_points: usize,
    /// Suppression period after an alert fires
    pub cool_down_minutes: u64,
    /// Percentage thresholds keyed by instrument class
    pub thresholds: HashMap<InstrumentClass, Thresholds>,
}

impl TriggerConfig {
    /// Window length, clamped to [`MAX_TRIGGER_MINUTES`]
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.time_window_minutes.min(MAX_TRIGGER_MINUTES) as i64)
    }

    /// Cooldown length, clamped to [`MAX_TRIGGER_MINUTES`]
    pub fn cool_down(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cool_down_minutes.min(MAX_TRIGGER_MINUTES) as i64)
    }
}

/// A monitored instrument
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    #[serde(default = "default_class")]
    pub class: InstrumentClass,
    /// Company or index name, used for news lookups
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alerts: DisplayThresholds,
}

/// Per-instrument thresholds shown next to an alert
///
/// Display only; triggering is decided by `trigger.thresholds`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayThresholds {
    /// Absolute price change in currency units
    pub price_change: Option<Decimal>,
    /// Percentage change
    pub percentage_change: Option<Decimal>,
}

fn default_class() -> InstrumentClass {
    InstrumentClass::Stock
}

/// Price source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint for streamed trades (stocks)
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// REST base URL for quote polling (indices)
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Provider API key; `FINNHUB_API_KEY` takes precedence
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Skip polling while the US equity market is closed
    #[serde(default = "default_true")]
    pub market_hours_only: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

fn default_ws_url() -> String {
    "wss://ws.finnhub.io".to_string()
}
fn default_rest_url() -> String {
    "https://finnhub.io/api/v1".to_string()
}
fn default_poll_interval() -> u64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_request_timeout() -> u64 {
    10
}
fn default_ping_interval() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            api_key: None,
            poll_interval_secs: default_poll_interval(),
            market_hours_only: true,
            request_timeout_secs: default_request_timeout(),
            ping_interval_secs: default_ping_interval(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

/// Reconnect / retry backoff settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_secs() -> u64 {
    60
}
fn default_max_attempts() -> u32 {
    10
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl BackoffConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_secs(self.max_delay_secs),
            self.max_attempts,
        )
    }
}

/// Alert delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Sound played on every alert; no sound when unset
    #[serde(default)]
    pub sound_file: Option<PathBuf>,
    /// Command used to play `sound_file`
    #[serde(default = "default_player")]
    pub player: String,
    /// Upper bound for each sink call
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
}

fn default_player() -> String {
    "afplay".to_string()
}
fn default_dispatch_timeout_ms() -> u64 {
    5000
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_file: None,
            player: default_player(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
        }
    }
}

impl AlertConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

/// News context lookup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_news_url")]
    pub api_url: String,
    #[serde(default = "default_news_model")]
    pub model: String,
    /// Chat API key; `DEEPSEEK_API_KEY` takes precedence
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound for one lookup, request included
    #[serde(default = "default_news_timeout")]
    pub timeout_secs: u64,
}

fn default_news_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}
fn default_news_model() -> String {
    "deepseek-chat".to_string()
}
fn default_news_timeout() -> u64 {
    20
}

impl NewsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_news_url(),
            model: default_news_model(),
            api_key: None,
            timeout_secs: default_news_timeout(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_port: None,
        }
    }
}

/// Configuration errors; all of them abort startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
    #[error("{field} must be at most {max}")]
    OutOfRange { field: &'static str, max: u64 },
    #[error("no instruments configured")]
    NoInstruments,
    #[error("instrument {0} configured more than once")]
    DuplicateInstrument(String),
    #[error("no thresholds configured for class {class} (needed by {symbol})")]
    MissingThresholds {
        class: InstrumentClass,
        symbol: String,
    },
    #[error("invalid thresholds for class {class}: up {up} must be > 0 and down {down} must be < 0")]
    InvalidThresholds {
        class: InstrumentClass,
        up: Decimal,
        down: Decimal,
    },
    #[error("missing API key: set {0} or the config value")]
    MissingApiKey(&'static str),
}

impl Config {
    /// Load configuration from a TOML file, apply environment overrides
    /// and validate
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(FINNHUB_API_KEY_ENV) {
            if !key.is_empty() {
                self.feed.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var(NEWS_API_KEY_ENV) {
            if !key.is_empty() {
                self.news.api_key = Some(key);
            }
        }
    }

    /// Check everything the engine relies on at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        let trigger = &self.trigger;
        if trigger.time_window_minutes == 0 {
            return Err(ConfigError::ZeroValue("trigger.time_window_minutes"));
        }
        if trigger.cool_down_minutes == 0 {
            return Err(ConfigError::ZeroValue("trigger.cool_down_minutes"));
        }
        if trigger.min_data_points == 0 {
            return Err(ConfigError::ZeroValue("trigger.min_data_points"));
        }
        if trigger.time_window_minutes > MAX_TRIGGER_MINUTES {
            return Err(ConfigError::OutOfRange {
                field: "trigger.time_window_minutes",
                max: MAX_TRIGGER_MINUTES,
            });
        }
        if trigger.cool_down_minutes > MAX_TRIGGER_MINUTES {
            return Err(ConfigError::OutOfRange {
                field: "trigger.cool_down_minutes",
                max: MAX_TRIGGER_MINUTES,
            });
        }

        for (class, t) in &trigger.thresholds {
            if t.up <= Decimal::ZERO || t.down >= Decimal::ZERO {
                return Err(ConfigError::InvalidThresholds {
                    class: *class,
                    up: t.up,
                    down: t.down,
                });
            }
        }

        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(ConfigError::DuplicateInstrument(instrument.symbol.clone()));
            }
            if !trigger.thresholds.contains_key(&instrument.class) {
                return Err(ConfigError::MissingThresholds {
                    class: instrument.class,
                    symbol: instrument.symbol.clone(),
                });
            }
        }

        if self.feed.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroValue("feed.poll_interval_secs"));
        }
        if self.feed.backoff.max_attempts == 0 {
            return Err(ConfigError::ZeroValue("feed.backoff.max_attempts"));
        }
        if self.alert.dispatch_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue("alert.dispatch_timeout_ms"));
        }
        if self.news.enabled && self.news.api_key.is_none() {
            return Err(ConfigError::MissingApiKey(NEWS_API_KEY_ENV));
        }

        Ok(())
    }

    /// Provider API key, required by the network sources
    pub fn feed_api_key(&self) -> Result<&str, ConfigError> {
        self.feed
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey(FINNHUB_API_KEY_ENV))
    }

    /// Symbols fed by the streaming source
    pub fn push_symbols(&self) -> Vec<String> {
        self.symbols_of(InstrumentClass::Stock)
    }

    /// Symbols fed by the polling source
    pub fn poll_symbols(&self) -> Vec<String> {
        self.symbols_of(InstrumentClass::Index)
    }

    fn symbols_of(&self, class: InstrumentClass) -> Vec<String> {
        self.instruments
            .iter()
            .filter(|i| i.class == class)
            .map(|i| i.symbol.clone())
            .collect()
    }

    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentConfig> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }
}
