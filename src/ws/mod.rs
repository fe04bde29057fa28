//! WebSocket client
//!
//! Streaming connection with resubscription on reconnect, ping keepalive
//! and bounded exponential backoff.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage};
