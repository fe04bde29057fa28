//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

use crate::feed::BackoffPolicy;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Text frames sent after every (re)connect
    pub subscriptions: Vec<String>,
    /// Reconnect delays and attempt budget
    pub backoff: BackoffPolicy,
    pub ping_interval: Duration,
    /// Connection is considered dead if a ping goes unanswered this long
    pub pong_timeout: Duration,
}

impl WsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subscriptions: Vec::new(),
            backoff: BackoffPolicy::default(),
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        }
    }

    pub fn subscribe(mut self, frame: impl Into<String>) -> Self {
        self.subscriptions.push(frame.into());
        self
    }

    pub fn backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = policy;
        self
    }

    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    pub fn pong_timeout(mut self, d: Duration) -> Self {
        self.pong_timeout = d;
        self
    }
}

/// Events delivered to the consumer of a [`super::WsClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum WsMessage {
    Text(String),
    /// Connected and subscriptions sent
    Connected,
    /// Connection lost; retrying after backoff
    Reconnecting { attempt: u32 },
    /// Stopped on shutdown
    Disconnected,
    /// Reconnect budget exhausted
    GaveUp { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum WsError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("server closed the connection")]
    ClosedByServer,
    #[error("no pong within {0:?}")]
    PongTimeout(Duration),
}
