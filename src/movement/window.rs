//! Per-instrument sliding window of recent price samples

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

use super::types::{MovementError, PriceSample};

/// Lower bound for the per-instrument sample cap
const MIN_WINDOW_CAP: usize = 100;

/// Ordered, age- and count-bounded sample windows keyed by instrument
///
/// Age is measured against the incoming sample's timestamp rather than the
/// wall clock, so replaying the same input always yields the same windows.
#[derive(Debug)]
pub struct WindowStore {
    windows: HashMap<String, VecDeque<PriceSample>>,
    window: Duration,
    cap: usize,
}

impl WindowStore {
    /// Create a store whose windows span `window` and hold at most
    /// `max(100, 2 * min_data_points)` samples
    pub fn new(window: Duration, min_data_points: usize) -> Self {
        Self {
            windows: HashMap::new(),
            window,
            cap: MIN_WINDOW_CAP.max(min_data_points.saturating_mul(2)),
        }
    }

    /// Maximum number of samples retained per instrument
    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Append a sample, pruning expired samples first and truncating to the cap
    ///
    /// A sample older than the newest stored one is rejected and leaves the
    /// window untouched.
    pub fn append(&mut self, instrument_id: &str, sample: PriceSample) -> Result<(), MovementError> {
        let window = self.windows.entry(instrument_id.to_string()).or_default();

        if let Some(last) = window.back() {
            if sample.observed_at() < last.observed_at() {
                return Err(MovementError::OutOfOrderSample {
                    instrument_id: instrument_id.to_string(),
                    observed_at: sample.observed_at(),
                    last_observed_at: last.observed_at(),
                });
            }
        }

        // No cutoff representable means nothing can have expired yet
        if let Some(cutoff) = sample.observed_at().checked_sub_signed(self.window) {
            prune_before(window, cutoff);
        }

        window.push_back(sample);
        while window.len() > self.cap {
            window.pop_front();
        }

        Ok(())
    }

    /// Copy of the current window, oldest first; empty for unknown instruments
    pub fn snapshot(&self, instrument_id: &str) -> Vec<PriceSample> {
        self.windows
            .get(instrument_id)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of samples currently held for an instrument
    pub fn len(&self, instrument_id: &str) -> usize {
        self.windows.get(instrument_id).map_or(0, VecDeque::len)
    }

    /// Timestamp of the newest stored sample
    pub fn last_observed(&self, instrument_id: &str) -> Option<DateTime<Utc>> {
        self.windows
            .get(instrument_id)
            .and_then(|w| w.back())
            .map(PriceSample::observed_at)
    }

    /// Instruments that have received at least one sample
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }
}

fn prune_before(window: &mut VecDeque<PriceSample>, cutoff: DateTime<Utc>) {
    while let Some(front) = window.front() {
        if front.observed_at() < cutoff {
            window.pop_front();
        } else {
            break;
        }
    }
}
