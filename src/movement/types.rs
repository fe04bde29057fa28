//! Movement detection types
//!
//! Samples, window-derived movement results and the trigger produced when a
//! movement crosses its class thresholds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raw price update as enqueued by an ingestion source
///
/// Not validated; the engine turns it into a [`PriceSample`] or rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Instrument identifier (e.g., "AAPL", "^GSPC")
    pub instrument_id: String,
    /// Observed price
    pub price: Decimal,
    /// When the price was observed
    pub observed_at: DateTime<Utc>,
}

impl PriceUpdate {
    pub fn new(instrument_id: impl Into<String>, price: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            price,
            observed_at,
        }
    }
}

/// A validated price observation
///
/// Only constructible through [`PriceSample::new`], so `price > 0` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSample {
    price: Decimal,
    observed_at: DateTime<Utc>,
}

impl PriceSample {
    /// Create a sample, rejecting non-positive prices
    pub fn new(price: Decimal, observed_at: DateTime<Utc>) -> Result<Self, MovementError> {
        if price <= Decimal::ZERO {
            return Err(MovementError::InvalidSample { price });
        }
        Ok(Self { price, observed_at })
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

impl TryFrom<&PriceUpdate> for PriceSample {
    type Error = MovementError;

    fn try_from(update: &PriceUpdate) -> Result<Self, Self::Error> {
        PriceSample::new(update.price, update.observed_at)
    }
}

/// Instrument class; each class has its own threshold set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentClass {
    /// Individual equity
    Stock,
    /// Market index
    Index,
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentClass::Stock => write!(f, "stock"),
            InstrumentClass::Index => write!(f, "index"),
        }
    }
}

/// Percentage thresholds for one instrument class
///
/// `up` is positive and `down` negative, both in percent (2.0 = 2%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub up: Decimal,
    pub down: Decimal,
}

impl Thresholds {
    pub fn new(up: Decimal, down: Decimal) -> Self {
        Self { up, down }
    }
}

/// Movement across the current window, oldest sample to newest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementResult {
    pub base_price: Decimal,
    pub current_price: Decimal,
    pub absolute_change: Decimal,
    /// Change in percent: `absolute_change / base_price * 100`
    pub percentage_change: Decimal,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Why a movement was considered alert-worthy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerReason {
    /// Percentage change reached the up threshold
    PercentageUp { threshold: Decimal },
    /// Percentage change reached the down threshold
    PercentageDown { threshold: Decimal },
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::PercentageUp { threshold } => write!(f, "up >= {}%", threshold),
            TriggerReason::PercentageDown { threshold } => write!(f, "down <= {}%", threshold),
        }
    }
}

/// A threshold breach that the cooldown gate let through
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub instrument_id: String,
    pub class: InstrumentClass,
    pub movement: MovementResult,
    pub reason: TriggerReason,
}

/// Per-item errors raised by the movement pipeline
///
/// None of these is fatal: the offending item is dropped and logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    /// Price was zero or negative
    #[error("invalid sample: non-positive price {price}")]
    InvalidSample { price: Decimal },
    /// Sample is older than the newest stored sample for the instrument
    #[error("out-of-order sample for {instrument_id}: {observed_at} precedes {last_observed_at}")]
    OutOfOrderSample {
        instrument_id: String,
        observed_at: DateTime<Utc>,
        last_observed_at: DateTime<Utc>,
    },
    /// Oldest sample in the window has a zero price
    #[error("invalid data: zero base price")]
    ZeroBasePrice,
    /// Percentage change does not fit a decimal
    #[error("movement overflow: {current_price} against base {base_price}")]
    Overflow { base_price: Decimal, current_price: Decimal },
    /// Instrument is not configured
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),
}

impl MovementError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            MovementError::InvalidSample { .. } => "invalid_sample",
            MovementError::OutOfOrderSample { .. } => "out_of_order",
            MovementError::ZeroBasePrice => "zero_base_price",
            MovementError::Overflow { .. } => "overflow",
            MovementError::UnknownInstrument(_) => "unknown_instrument",
        }
    }
}
