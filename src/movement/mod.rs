//! Price movement detection
//!
//! Sliding windows of recent samples per instrument, percentage movement
//! across each window, and a cooldown gate that keeps one breach from
//! raising an alert storm.

mod cooldown;
mod evaluator;
mod types;
mod window;

pub use cooldown::{CooldownGate, GateState};
pub use evaluator::MovementEvaluator;
pub use types::{
    InstrumentClass, MovementError, MovementResult, PriceSample, PriceUpdate, Thresholds, Trigger,
    TriggerReason,
};
pub use window::WindowStore;
