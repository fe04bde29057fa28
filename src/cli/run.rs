//! Run command implementation

use clap::Args;

use super::{build_dispatcher, log_windows, print_stats};
use crate::config::Config;
use crate::engine::{IngestionRouter, MovementEngine, Shutdown, DEFAULT_QUEUE_CAPACITY};
use crate::feed::{FinnhubFeed, IngestionSource, QuotePoller};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Do not play the alert sound
    #[arg(long)]
    pub no_sound: bool,

    /// Skip news lookups even if enabled in config
    #[arg(long)]
    pub no_news: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dispatcher = build_dispatcher(config, !self.no_sound, !self.no_news)?;
        let mut engine = MovementEngine::new(&config.trigger, config.instruments.clone(), dispatcher);

        let api_key = config.feed_api_key()?;
        let mut sources: Vec<Box<dyn IngestionSource>> = Vec::new();
        let push = config.push_symbols();
        if !push.is_empty() {
            sources.push(Box::new(FinnhubFeed::new(&config.feed, api_key, push)));
        }
        let poll = config.poll_symbols();
        if !poll.is_empty() {
            sources.push(Box::new(QuotePoller::new(&config.feed, api_key, poll)?));
        }

        let (handle, router) = IngestionRouter::channel(DEFAULT_QUEUE_CAPACITY);
        let shutdown = Shutdown::new();

        let mut tasks = Vec::new();
        for source in sources {
            let queue = handle.clone();
            let signal = shutdown.subscribe();
            tasks.push(tokio::spawn(async move {
                let name = source.name().to_string();
                match source.run(queue, signal).await {
                    Ok(()) => tracing::info!(source = %name, "Ingestion source stopped"),
                    Err(e) => tracing::error!(source = %name, error = %e, "Ingestion source failed"),
                }
            }));
        }
        // Router exits on its own once every source is gone
        drop(handle);

        let ctrl_c = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, shutting down");
                ctrl_c.trigger();
            }
        });

        tracing::info!(sources = tasks.len(), "Monitoring started");
        let stats = router.run(&mut engine, shutdown.subscribe()).await;

        shutdown.trigger();
        for task in tasks {
            let _ = task.await;
        }

        tracing::info!(
            processed = stats.processed,
            rejected = stats.rejected,
            suppressed = stats.suppressed,
            dispatched = stats.dispatched,
            "Monitoring stopped"
        );
        log_windows(engine.windows());
        print_stats(&stats);
        Ok(())
    }
}
