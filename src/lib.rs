//! stock-sentinel: price movement alerts with cooldown debouncing
//!
//! This library provides the core components for:
//! - Sliding price windows per instrument
//! - Percentage movement evaluation against per-class thresholds
//! - Per-instrument alert cooldowns
//! - A single-consumer ingestion queue fed by push and poll sources
//! - Alert fan-out to console and sound, with optional news context
//! - Logging and Prometheus metrics

pub mod alert;
pub mod cli;
pub mod config;
pub mod engine;
pub mod feed;
pub mod movement;
pub mod telemetry;
pub mod ws;
