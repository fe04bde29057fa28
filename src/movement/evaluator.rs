//! Movement evaluation over a window snapshot
//!
//! Movement is measured from the oldest sample in the window to the newest.
//! Only the percentage change decides whether a movement triggers; absolute
//! price thresholds are display-only.

use rust_decimal::Decimal;
use std::collections::HashMap;

use super::types::{InstrumentClass, MovementError, MovementResult, PriceSample, Thresholds, TriggerReason};

/// Computes window movement and checks it against per-class thresholds
#[derive(Debug, Clone)]
pub struct MovementEvaluator {
    min_data_points: usize,
    thresholds: HashMap<InstrumentClass, Thresholds>,
}

impl MovementEvaluator {
    pub fn new(min_data_points: usize, thresholds: HashMap<InstrumentClass, Thresholds>) -> Self {
        Self {
            min_data_points,
            thresholds,
        }
    }

    pub fn min_data_points(&self) -> usize {
        self.min_data_points
    }

    pub fn thresholds(&self, class: InstrumentClass) -> Option<&Thresholds> {
        self.thresholds.get(&class)
    }

    /// Movement across the snapshot
    ///
    /// `Ok(None)` means there is not enough data yet to decide.
    pub fn movement(&self, snapshot: &[PriceSample]) -> Result<Option<MovementResult>, MovementError> {
        if snapshot.len() < self.min_data_points.max(1) {
            return Ok(None);
        }

        let (Some(first), Some(last)) = (snapshot.first(), snapshot.last()) else {
            return Ok(None);
        };

        let base_price = first.price();
        if base_price.is_zero() {
            return Err(MovementError::ZeroBasePrice);
        }

        let current_price = last.price();
        let absolute_change = current_price - base_price;
        let percentage_change = absolute_change
            .checked_div(base_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(MovementError::Overflow {
                base_price,
                current_price,
            })?;

        Ok(Some(MovementResult {
            base_price,
            current_price,
            absolute_change,
            percentage_change,
            window_start: first.observed_at(),
            window_end: last.observed_at(),
        }))
    }

    /// Threshold check for the instrument's class
    ///
    /// Returns `None` when the class has no thresholds; configuration
    /// validation rejects that case before the engine starts.
    pub fn check(&self, class: InstrumentClass, movement: &MovementResult) -> Option<TriggerReason> {
        let thresholds = self.thresholds.get(&class)?;
        let pct = movement.percentage_change;

        if pct >= thresholds.up {
            Some(TriggerReason::PercentageUp {
                threshold: thresholds.up,
            })
        } else if pct <= thresholds.down {
            Some(TriggerReason::PercentageDown {
                threshold: thresholds.down,
            })
        } else {
            None
        }
    }
}
