//! CLI interface for stock-sentinel
//!
//! Provides subcommands for:
//! - `run`: Monitor live prices and raise alerts
//! - `replay`: Feed recorded prices through the engine
//! - `config`: Validate and show configuration

mod replay;
mod run;

pub use replay::ReplayArgs;
pub use run::RunArgs;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::alert::{AlertDispatcher, ChatNewsProvider, ConsoleSink, SoundSink};
use crate::config::Config;
use crate::engine::RouterStats;
use crate::movement::WindowStore;

#[derive(Parser, Debug)]
#[command(name = "stock-sentinel")]
#[command(about = "Price movement alerts with cooldown debouncing and news context")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor live prices and raise alerts
    Run(RunArgs),
    /// Feed a JSON-lines price file through the engine
    Replay(ReplayArgs),
    /// Validate and show configuration
    Config,
}

/// Console always; sound and news when configured and wanted
fn build_dispatcher(config: &Config, with_sound: bool, with_news: bool) -> anyhow::Result<AlertDispatcher> {
    let mut dispatcher =
        AlertDispatcher::new(config.alert.dispatch_timeout()).with_sink(Arc::new(ConsoleSink::new()));

    if with_sound {
        if let Some(file) = &config.alert.sound_file {
            let sink = SoundSink::new(&config.alert.player, file.clone()).context("invalid [alert] sound_file")?;
            dispatcher = dispatcher.with_sink(Arc::new(sink));
        }
    }

    if with_news && config.news.enabled {
        let provider = ChatNewsProvider::new(&config.news).context("invalid [news] configuration")?;
        dispatcher = dispatcher.with_news(Arc::new(provider), config.news.timeout());
    }

    tracing::info!(sinks = ?dispatcher.sink_names(), "Alert dispatcher ready");
    Ok(dispatcher)
}

/// One log line per instrument that received samples
fn log_windows(store: &WindowStore) {
    let mut ids: Vec<&str> = store.instruments().collect();
    ids.sort_unstable();
    for id in ids {
        tracing::info!(
            instrument = %id,
            samples = store.len(id),
            last_observed = ?store.last_observed(id),
            "Window at exit"
        );
    }
}

fn print_stats(stats: &RouterStats) {
    println!("Processed:  {}", stats.processed);
    println!("Rejected:   {}", stats.rejected);
    println!("Suppressed: {}", stats.suppressed);
    println!("Dispatched: {}", stats.dispatched);
}

/// Print the effective configuration
pub fn print_config(config: &Config) {
    let trigger = &config.trigger;
    println!("Current configuration:");
    println!(
        "  Trigger: window={}m, min_points={}, cooldown={}m",
        trigger.time_window_minutes, trigger.min_data_points, trigger.cool_down_minutes
    );
    let mut classes: Vec<_> = trigger.thresholds.iter().collect();
    classes.sort_by_key(|(class, _)| class.to_string());
    for (class, t) in classes {
        println!("  Thresholds [{}]: up {}%, down {}%", class, t.up, t.down);
    }
    for instrument in &config.instruments {
        println!(
            "  Instrument: {} [{}]{}",
            instrument.symbol,
            instrument.class,
            instrument
                .name
                .as_deref()
                .map(|n| format!(" {}", n))
                .unwrap_or_default()
        );
    }
    println!(
        "  Feed: push={:?} poll={:?} every {}s (market hours only: {})",
        config.push_symbols(),
        config.poll_symbols(),
        config.feed.poll_interval_secs,
        config.feed.market_hours_only
    );
    println!("  API key: {}", if config.feed.api_key.is_some() { "set" } else { "missing" });
    println!(
        "  Alert: sound={}, timeout={}ms",
        config
            .alert
            .sound_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "off".to_string()),
        config.alert.dispatch_timeout_ms
    );
    println!(
        "  News: {}",
        if config.news.enabled {
            format!("{} ({})", config.news.model, config.news.api_url)
        } else {
            "off".to_string()
        }
    );
}
