//! Ingestion and evaluation engine
//!
//! Producers enqueue raw updates; one consumer applies them to the engine
//! state in order:
//!
//! source -> queue -> window store -> evaluator -> cooldown gate -> dispatcher

mod pipeline;
mod router;
mod shutdown;
mod types;

pub use pipeline::MovementEngine;
pub use router::{IngestHandle, IngestionRouter, DEFAULT_QUEUE_CAPACITY};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use types::{Outcome, QueueClosed, RouterStats};
