//! Ingestion router
//!
//! Producers only ever enqueue. A single consumer drains the queue and runs
//! each update through the engine before taking the next, so updates for an
//! instrument are applied strictly in arrival order.

use tokio::sync::mpsc;

use super::pipeline::MovementEngine;
use super::shutdown::ShutdownSignal;
use super::types::{QueueClosed, RouterStats};
use crate::movement::PriceUpdate;

/// Default queue capacity; producers wait when it is full
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Producer side of the ingestion queue
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<PriceUpdate>,
}

impl IngestHandle {
    /// Enqueue an update, waiting for space if the queue is full
    pub async fn enqueue(&self, update: PriceUpdate) -> Result<(), QueueClosed> {
        self.tx.send(update).await.map_err(|_| QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single consumer of the ingestion queue
#[derive(Debug)]
pub struct IngestionRouter {
    rx: mpsc::Receiver<PriceUpdate>,
}

impl IngestionRouter {
    /// Create a bounded queue and its consumer
    pub fn channel(capacity: usize) -> (IngestHandle, IngestionRouter) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (IngestHandle { tx }, IngestionRouter { rx })
    }

    /// Consume updates until every producer is gone or shutdown is requested
    ///
    /// On shutdown, updates already queued are still processed before
    /// returning; new enqueues fail with [`QueueClosed`].
    pub async fn run(mut self, engine: &mut MovementEngine, mut shutdown: ShutdownSignal) -> RouterStats {
        let mut stats = RouterStats::default();
        tracing::info!("Ingestion router started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, draining ingestion queue");
                    break;
                }

                update = self.rx.recv() => {
                    match update {
                        Some(update) => Self::handle(engine, update, &mut stats).await,
                        None => {
                            tracing::info!("All producers closed, router stopping");
                            return stats;
                        }
                    }
                }
            }
        }

        self.rx.close();
        let mut drained = 0u64;
        while let Some(update) = self.rx.recv().await {
            Self::handle(engine, update, &mut stats).await;
            drained += 1;
        }

        tracing::info!(
            drained,
            processed = stats.processed,
            dispatched = stats.dispatched,
            "Ingestion router stopped"
        );
        stats
    }

    /// Take the next raw update, bypassing the engine
    #[cfg(test)]
    pub(crate) async fn next_update(&mut self) -> Option<PriceUpdate> {
        self.rx.recv().await
    }

    async fn handle(engine: &mut MovementEngine, update: PriceUpdate, stats: &mut RouterStats) {
        stats.processed += 1;
        match engine.process_logged(update).await {
            Some(outcome) => stats.record(&outcome),
            None => stats.rejected += 1,
        }
    }
}
