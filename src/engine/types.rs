//! Engine types

use thiserror::Error;

use crate::alert::DispatchReport;

/// What happened to a single dequeued update
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Stored, but the window does not hold enough samples yet
    Pending,
    /// Stored and evaluated; no threshold crossed
    Recorded,
    /// Threshold crossed while the instrument was cooling down
    Suppressed,
    /// Threshold crossed and the alert was dispatched
    Dispatched(DispatchReport),
}

/// Counters kept by the router over its lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Updates taken off the queue
    pub processed: u64,
    /// Updates dropped as invalid, out of order or unknown
    pub rejected: u64,
    /// Breaches discarded by the cooldown gate
    pub suppressed: u64,
    /// Alerts handed to the dispatcher
    pub dispatched: u64,
}

impl RouterStats {
    pub(crate) fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Pending | Outcome::Recorded => {}
            Outcome::Suppressed => self.suppressed += 1,
            Outcome::Dispatched(_) => self.dispatched += 1,
        }
    }
}

/// The router has stopped and no longer accepts updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ingestion queue closed")]
pub struct QueueClosed;
