//! Replay command implementation

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use super::{build_dispatcher, log_windows, print_stats};
use crate::config::Config;
use crate::engine::{IngestionRouter, MovementEngine, Shutdown, DEFAULT_QUEUE_CAPACITY};
use crate::feed::{IngestionSource, ReplaySource};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of price updates
    pub file: PathBuf,

    /// Look up news for replayed alerts
    #[arg(long)]
    pub with_news: bool,
}

impl ReplayArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let source = ReplaySource::from_file(&self.file)?;
        tracing::info!(file = %self.file.display(), updates = source.len(), "Replaying price file");

        let dispatcher = build_dispatcher(config, false, self.with_news)?;
        let mut engine = MovementEngine::new(&config.trigger, config.instruments.clone(), dispatcher);
        let (handle, router) = IngestionRouter::channel(DEFAULT_QUEUE_CAPACITY);
        let shutdown = Shutdown::new();

        let signal = shutdown.subscribe();
        let producer = tokio::spawn(async move { source.run(handle, signal).await });

        let stats = router.run(&mut engine, shutdown.subscribe()).await;
        producer.await.context("replay task panicked")??;

        log_windows(engine.windows());
        print_stats(&stats);
        Ok(())
    }
}
