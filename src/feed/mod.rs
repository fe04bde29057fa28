//! Ingestion sources
//!
//! Every source turns provider data into [`PriceUpdate`]s and enqueues them
//! on the shared ingestion queue; none of them touch the engine directly.
//!
//! [`PriceUpdate`]: crate::movement::PriceUpdate

mod backoff;
mod finnhub;
pub mod market_hours;
mod poll;
mod replay;

pub use backoff::{Backoff, BackoffPolicy};
pub use finnhub::FinnhubFeed;
pub use market_hours::is_market_open;
pub use poll::QuotePoller;
pub use replay::ReplaySource;

use async_trait::async_trait;

use crate::engine::{IngestHandle, ShutdownSignal};

/// A producer of price updates
#[async_trait]
pub trait IngestionSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Produce updates until shutdown, exhaustion, or the queue closes
    ///
    /// An error means the source gave up and will produce nothing more.
    async fn run(&self, queue: IngestHandle, shutdown: ShutdownSignal) -> anyhow::Result<()>;
}
