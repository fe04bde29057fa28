//! Alert types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DisplayThresholds;
use crate::movement::{InstrumentClass, MovementResult, TriggerReason};

/// A dispatched alert, as handed to every sink
#[derive(Debug, Clone)]
pub struct Alert {
    /// Correlates log lines of all sinks for this alert
    pub id: Uuid,
    pub instrument_id: String,
    /// Company or index name, if configured
    pub name: Option<String>,
    pub class: InstrumentClass,
    pub movement: MovementResult,
    pub reason: TriggerReason,
    /// Display-only thresholds configured for the instrument
    pub display: DisplayThresholds,
    /// News context; empty when lookup is disabled or failed
    pub context: Vec<NewsItem>,
    /// Whether a news lookup was attempted
    pub context_requested: bool,
    pub raised_at: DateTime<Utc>,
}

/// One piece of contextual news
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
}

/// Input to a news context lookup
#[derive(Debug, Clone)]
pub struct NewsQuery {
    pub instrument_id: String,
    pub name: Option<String>,
    pub class: InstrumentClass,
    pub movement: MovementResult,
}

/// Result of dispatching one alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub alert_id: Uuid,
    /// Sinks that accepted the alert
    pub delivered: usize,
    /// Names of sinks that failed or timed out
    pub failed: Vec<String>,
    pub context_items: usize,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Alert delivery errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert sound file not found: {0}")]
    SoundFileMissing(PathBuf),
    #[error("sound player {player} exited with {status}")]
    PlayerFailed { player: String, status: String },
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: String, after: Duration },
    #[error("news API returned {status}: {body}")]
    NewsApi { status: u16, body: String },
}
