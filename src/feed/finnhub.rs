//! Finnhub WebSocket trade feed

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{BackoffPolicy, IngestionSource};
use crate::config::FeedConfig;
use crate::engine::{IngestHandle, ShutdownSignal};
use crate::movement::PriceUpdate;
use crate::ws::{WsClient, WsConfig, WsMessage};

/// Messages pushed by the Finnhub stream
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum FinnhubMessage {
    Trade {
        data: Vec<FinnhubTrade>,
    },
    Ping,
    Error {
        msg: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct FinnhubTrade {
    /// Symbol
    s: String,
    /// Last price
    p: Decimal,
    /// Trade time (milliseconds)
    t: i64,
}

/// Streaming trades for the push-fed symbols
pub struct FinnhubFeed {
    ws_url: String,
    symbols: Vec<String>,
    backoff: BackoffPolicy,
    ping_interval: Duration,
}

impl FinnhubFeed {
    pub fn new(config: &FeedConfig, api_key: &str, symbols: Vec<String>) -> Self {
        Self {
            ws_url: format!("{}?token={}", config.ws_url, api_key),
            symbols,
            backoff: config.backoff.policy(),
            ping_interval: config.ping_interval(),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn subscribe_frame(symbol: &str) -> String {
        format!(r#"{{"type":"subscribe","symbol":"{}"}}"#, symbol)
    }

    fn ws_config(&self) -> WsConfig {
        self.symbols.iter().fold(
            WsConfig::new(&self.ws_url)
                .backoff(self.backoff)
                .ping_interval(self.ping_interval),
            |config, symbol| config.subscribe(Self::subscribe_frame(symbol)),
        )
    }

    /// Every trade in one message, in message order
    fn parse_message(text: &str) -> Result<Vec<PriceUpdate>, serde_json::Error> {
        let updates = match serde_json::from_str::<FinnhubMessage>(text)? {
            FinnhubMessage::Trade { data } => data
                .into_iter()
                .filter_map(|trade| {
                    let observed_at = Utc.timestamp_millis_opt(trade.t).single()?;
                    Some(PriceUpdate::new(trade.s, trade.p, observed_at))
                })
                .collect(),
            FinnhubMessage::Ping => {
                tracing::debug!("Finnhub heartbeat");
                Vec::new()
            }
            FinnhubMessage::Error { msg } => {
                tracing::warn!(error = %msg, "Finnhub reported an error");
                Vec::new()
            }
            FinnhubMessage::Other => Vec::new(),
        };
        Ok(updates)
    }

    async fn run_message_loop(mut ws_rx: mpsc::Receiver<WsMessage>, queue: IngestHandle) -> anyhow::Result<()> {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => {
                    let updates = match Self::parse_message(&text) {
                        Ok(updates) => updates,
                        Err(e) => {
                            tracing::warn!(error = %e, "Unparseable Finnhub message");
                            continue;
                        }
                    };
                    for update in updates {
                        if queue.enqueue(update).await.is_err() {
                            tracing::debug!("Ingestion queue closed, stopping Finnhub feed");
                            return Ok(());
                        }
                    }
                }
                WsMessage::Connected => {
                    tracing::info!("Finnhub feed connected");
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Finnhub feed reconnecting...");
                }
                WsMessage::Disconnected => {
                    tracing::info!("Finnhub feed disconnected");
                    break;
                }
                WsMessage::GaveUp { attempts } => {
                    anyhow::bail!("Finnhub feed gave up after {} connection attempts", attempts);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionSource for FinnhubFeed {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn run(&self, queue: IngestHandle, shutdown: ShutdownSignal) -> anyhow::Result<()> {
        tracing::info!(symbols = ?self.symbols, "Subscribing to Finnhub feed");
        let ws_rx = WsClient::new(self.ws_config()).connect(shutdown);
        Self::run_message_loop(ws_rx, queue).await
    }
}
