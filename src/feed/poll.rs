//! Finnhub REST quote poller for indices

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};

use super::{is_market_open, BackoffPolicy, IngestionSource};
use crate::config::FeedConfig;
use crate::engine::{IngestHandle, ShutdownSignal};
use crate::movement::PriceUpdate;

/// `GET /quote` response; only the fields we use
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Decimal,
    /// Provider quote time (seconds)
    #[serde(default)]
    t: i64,
}

enum PollStatus {
    Polled,
    QueueClosed,
}

/// Polls the latest quote of each symbol on a fixed interval
pub struct QuotePoller {
    client: Client,
    rest_url: String,
    api_key: String,
    symbols: Vec<String>,
    poll_every: Duration,
    market_hours_only: bool,
    backoff: BackoffPolicy,
}

impl QuotePoller {
    pub fn new(config: &FeedConfig, api_key: &str, symbols: Vec<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            rest_url: config.rest_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            symbols,
            poll_every: config.poll_interval(),
            market_hours_only: config.market_hours_only,
            backoff: config.backoff.policy(),
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<QuoteResponse> {
        let quote: QuoteResponse = self
            .client
            .get(format!("{}/quote", self.rest_url))
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(quote)
    }

    /// One pass over every symbol; fails only if no request succeeded
    async fn poll_once(&self, queue: &IngestHandle) -> anyhow::Result<PollStatus> {
        let mut last_error = None;
        let mut answered = 0usize;

        for symbol in &self.symbols {
            let quote = match self.fetch_quote(symbol).await {
                Ok(quote) => quote,
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Quote request failed");
                    last_error = Some(e.context(format!("quote request for {} failed", symbol)));
                    continue;
                }
            };

            answered += 1;

            // Sample time is local fetch time; provider time is only logged
            let fetched_at = Utc::now();
            if quote.c <= Decimal::ZERO {
                tracing::warn!(symbol = %symbol, price = %quote.c, "No quote available");
                continue;
            }
            tracing::debug!(
                symbol = %symbol,
                price = %quote.c,
                delay_secs = fetched_at.timestamp() - quote.t,
                "Quote received"
            );

            if queue
                .enqueue(PriceUpdate::new(symbol.clone(), quote.c, fetched_at))
                .await
                .is_err()
            {
                return Ok(PollStatus::QueueClosed);
            }
        }

        match last_error {
            Some(e) if answered == 0 => Err(e),
            _ => Ok(PollStatus::Polled),
        }
    }
}

#[async_trait]
impl IngestionSource for QuotePoller {
    fn name(&self) -> &str {
        "quote-poller"
    }

    async fn run(&self, queue: IngestHandle, mut shutdown: ShutdownSignal) -> anyhow::Result<()> {
        let mut ticker = interval(self.poll_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut backoff = self.backoff.start();

        tracing::info!(
            symbols = ?self.symbols,
            every_secs = self.poll_every.as_secs(),
            market_hours_only = self.market_hours_only,
            "Quote poller started"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Quote poller stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            if self.market_hours_only && !is_market_open(Utc::now()) {
                tracing::debug!("Market closed, skipping poll");
                continue;
            }

            match self.poll_once(&queue).await {
                Ok(PollStatus::Polled) => backoff.reset(),
                Ok(PollStatus::QueueClosed) => {
                    tracing::debug!("Ingestion queue closed, stopping quote poller");
                    return Ok(());
                }
                Err(e) => {
                    let Some(delay) = backoff.next_delay() else {
                        tracing::error!(error = %e, attempts = backoff.attempts(), "Quote poller giving up");
                        return Err(e.context(format!(
                            "quote poller gave up after {} attempts",
                            backoff.attempts()
                        )));
                    };
                    tracing::warn!(
                        error = %e,
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Quote poll failed, backing off"
                    );
                    tokio::select! {
                        _ = shutdown.recv() => return Ok(()),
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }
}
