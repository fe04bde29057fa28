//! Per-instrument alert cooldown
//!
//! Two states per instrument: Armed and Cooling. Expiry is evaluated lazily
//! when the next candidate arrives, using the candidate's own timestamp.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Gate state for a single instrument at a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No trigger yet, or the cooldown has elapsed
    Armed,
    /// A trigger fired recently; candidates are discarded
    Cooling { remaining: Duration },
}

/// Suppresses repeated triggers for an instrument within the cooldown period
#[derive(Debug)]
pub struct CooldownGate {
    cool_down: Duration,
    last_triggered: HashMap<String, DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new(cool_down: Duration) -> Self {
        Self {
            cool_down,
            last_triggered: HashMap::new(),
        }
    }

    pub fn cool_down(&self) -> Duration {
        self.cool_down
    }

    /// State of the gate for `instrument_id` as seen at `now`
    pub fn state(&self, instrument_id: &str, now: DateTime<Utc>) -> GateState {
        match self.last_triggered.get(instrument_id) {
            Some(last) => {
                let elapsed = now - *last;
                if elapsed >= self.cool_down {
                    GateState::Armed
                } else {
                    GateState::Cooling {
                        remaining: self.cool_down - elapsed,
                    }
                }
            }
            None => GateState::Armed,
        }
    }

    /// Let a candidate trigger through if the gate is armed
    ///
    /// On success the instrument enters Cooling with `at` as its trigger time.
    pub fn try_pass(&mut self, instrument_id: &str, at: DateTime<Utc>) -> bool {
        match self.state(instrument_id, at) {
            GateState::Armed => {
                self.last_triggered.insert(instrument_id.to_string(), at);
                true
            }
            GateState::Cooling { .. } => false,
        }
    }

    /// When the instrument last triggered
    pub fn last_triggered(&self, instrument_id: &str) -> Option<DateTime<Utc>> {
        self.last_triggered.get(instrument_id).copied()
    }
}
