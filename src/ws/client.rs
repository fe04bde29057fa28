//! WebSocket client with automatic reconnection

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::types::{WsConfig, WsError, WsMessage};
use crate::engine::ShutdownSignal;

/// How a single connection ended
enum SessionEnd {
    /// Shutdown requested or consumer gone
    Stopped,
    /// Lost after a successful connect; `healthy` once a data frame arrived
    Lost { error: WsError, healthy: bool },
}

/// WebSocket client that resubscribes on every reconnect
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Spawn the connection task and return its event stream
    ///
    /// The stream ends after `Disconnected` (shutdown) or `GaveUp`
    /// (reconnect budget spent).
    pub fn connect(&self, shutdown: ShutdownSignal) -> mpsc::Receiver<WsMessage> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tokio::spawn(async move {
            Self::run_connection_loop(config, tx, shutdown).await;
        });

        rx
    }

    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut shutdown: ShutdownSignal,
    ) {
        let mut backoff = config.backoff.start();

        loop {
            let error = match Self::connect_and_stream(&config, &tx, &mut shutdown).await {
                Ok(SessionEnd::Stopped) => {
                    tracing::info!(url = %redact(&config.url), "WebSocket stopped");
                    let _ = tx.send(WsMessage::Disconnected).await;
                    return;
                }
                Ok(SessionEnd::Lost { error, healthy }) => {
                    // A handshake alone does not count; the server may close right away
                    if healthy {
                        backoff.reset();
                    }
                    error
                }
                Err(e) => e,
            };

            let Some(delay) = backoff.next_delay() else {
                tracing::error!(error = %error, attempts = backoff.attempts(), "Max reconnection attempts reached");
                let _ = tx
                    .send(WsMessage::GaveUp {
                        attempts: backoff.attempts(),
                    })
                    .await;
                return;
            };

            tracing::warn!(
                error = %error,
                attempt = backoff.attempts(),
                delay_ms = delay.as_millis() as u64,
                "WebSocket connection error, reconnecting..."
            );

            if tx
                .send(WsMessage::Reconnecting {
                    attempt: backoff.attempts(),
                })
                .await
                .is_err()
            {
                return;
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    let _ = tx.send(WsMessage::Disconnected).await;
                    return;
                }
                _ = sleep(delay) => {}
            }
        }
    }

    /// `Err` means the connection never came up
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        shutdown: &mut ShutdownSignal,
    ) -> Result<SessionEnd, WsError> {
        tracing::info!(url = %redact(&config.url), "Connecting to WebSocket");

        let connected = tokio::select! {
            _ = shutdown.recv() => return Ok(SessionEnd::Stopped),
            result = connect_async(config.url.as_str()) => result,
        };
        let (ws_stream, _response) = connected.map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        for frame in &config.subscriptions {
            write
                .send(Message::Text(frame.clone()))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))?;
        }

        tracing::info!(subscriptions = config.subscriptions.len(), "WebSocket connected");
        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(SessionEnd::Stopped);
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ping_interval.tick().await;

        let mut pong_deadline: Option<Instant> = None;
        let mut healthy = false;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Stopped);
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            healthy = true;
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(SessionEnd::Stopped);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                return Ok(SessionEnd::Lost { error: WsError::SendFailed(e.to_string()), healthy });
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {
                            pong_deadline = None;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(frame = ?frame, "Received close frame");
                            return Ok(SessionEnd::Lost { error: WsError::ClosedByServer, healthy });
                        }
                        Some(Err(e)) => {
                            return Ok(SessionEnd::Lost { error: WsError::ConnectionFailed(e.to_string()), healthy });
                        }
                        None => {
                            return Ok(SessionEnd::Lost { error: WsError::ConnectionFailed("stream ended unexpectedly".into()), healthy });
                        }
                        _ => {}
                    }
                }

                _ = ping_interval.tick() => {
                    if let Err(e) = write.send(Message::Ping(Vec::new())).await {
                        return Ok(SessionEnd::Lost { error: WsError::SendFailed(e.to_string()), healthy });
                    }
                    if pong_deadline.is_none() {
                        pong_deadline = Some(Instant::now() + config.pong_timeout);
                    }
                }

                _ = async {
                    match pong_deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => std::future::pending().await,
                    }
                } => {
                    return Ok(SessionEnd::Lost { error: WsError::PongTimeout(config.pong_timeout), healthy });
                }
            }
        }
    }
}

/// Strip the query string, which carries the API token
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
