//! Per-update pipeline: append, evaluate, gate, dispatch
//!
//! `MovementEngine` owns every piece of mutable per-instrument state. It is
//! driven by a single consumer, so none of it needs locking.

use std::collections::HashMap;

use super::types::Outcome;
use crate::alert::AlertDispatcher;
use crate::config::{InstrumentConfig, TriggerConfig};
use crate::movement::{
    CooldownGate, MovementError, MovementEvaluator, PriceSample, PriceUpdate, Trigger, WindowStore,
};
use crate::telemetry::{increment, increment_rejected, CounterMetric};

/// Movement detection and alert debouncing for a fixed set of instruments
pub struct MovementEngine {
    instruments: HashMap<String, InstrumentConfig>,
    store: WindowStore,
    evaluator: MovementEvaluator,
    gate: CooldownGate,
    dispatcher: AlertDispatcher,
}

impl MovementEngine {
    pub fn new(
        trigger: &TriggerConfig,
        instruments: impl IntoIterator<Item = InstrumentConfig>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.symbol.clone(), i))
                .collect(),
            store: WindowStore::new(trigger.window(), trigger.min_data_points),
            evaluator: MovementEvaluator::new(trigger.min_data_points, trigger.thresholds.clone()),
            gate: CooldownGate::new(trigger.cool_down()),
            dispatcher,
        }
    }

    /// Run one update through the whole pipeline
    ///
    /// Lookup and validation errors reject the update before it touches any
    /// state. An overflowing movement leaves the sample in its window.
    pub async fn process(&mut self, update: PriceUpdate) -> Result<Outcome, MovementError> {
        let instrument = self
            .instruments
            .get(&update.instrument_id)
            .ok_or_else(|| MovementError::UnknownInstrument(update.instrument_id.clone()))?;
        let id = instrument.symbol.as_str();

        let sample = PriceSample::try_from(&update)?;
        self.store.append(id, sample)?;
        increment(CounterMetric::SamplesAccepted, id);

        let snapshot = self.store.snapshot(id);
        let Some(movement) = self.evaluator.movement(&snapshot)? else {
            tracing::trace!(
                instrument = %id,
                samples = snapshot.len(),
                required = self.evaluator.min_data_points(),
                "Not enough samples yet"
            );
            return Ok(Outcome::Pending);
        };

        let Some(reason) = self.evaluator.check(instrument.class, &movement) else {
            tracing::debug!(
                instrument = %id,
                pct = %movement.percentage_change.round_dp(4),
                "Movement within thresholds"
            );
            return Ok(Outcome::Recorded);
        };

        if !self.gate.try_pass(id, movement.window_end) {
            tracing::debug!(
                instrument = %id,
                pct = %movement.percentage_change.round_dp(4),
                "Threshold crossed during cooldown, suppressed"
            );
            increment(CounterMetric::AlertsSuppressed, id);
            return Ok(Outcome::Suppressed);
        }

        tracing::info!(
            instrument = %id,
            class = %instrument.class,
            base = %movement.base_price,
            current = %movement.current_price,
            pct = %movement.percentage_change.round_dp(4),
            reason = %reason,
            "Movement alert triggered"
        );
        increment(CounterMetric::AlertsTriggered, id);

        let trigger = Trigger {
            instrument_id: id.to_string(),
            class: instrument.class,
            movement,
            reason,
        };
        let report = self.dispatcher.dispatch(&trigger, instrument).await;

        Ok(Outcome::Dispatched(report))
    }

    /// Run an update and log instead of returning errors
    pub(crate) async fn process_logged(&mut self, update: PriceUpdate) -> Option<Outcome> {
        let instrument_id = update.instrument_id.clone();
        match self.process(update).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                match &e {
                    MovementError::OutOfOrderSample { .. } => {
                        tracing::warn!(instrument = %instrument_id, error = %e, "Dropped out-of-order sample")
                    }
                    _ => tracing::warn!(instrument = %instrument_id, error = %e, "Dropped update"),
                }
                increment_rejected(e.kind());
                None
            }
        }
    }

    pub fn windows(&self) -> &WindowStore {
        &self.store
    }

    pub fn cooldowns(&self) -> &CooldownGate {
        &self.gate
    }
}
