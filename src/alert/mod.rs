//! Alert dispatch
//!
//! Fans a confirmed trigger out to the configured sinks (console, sound),
//! optionally enriched with news context looked up just before delivery.

mod console;
mod dispatcher;
mod news;
mod sound;
mod types;

pub use console::{format_alert, ConsoleSink};
pub use dispatcher::AlertDispatcher;
pub use news::{format_news_alert, parse_news_content, ChatNewsProvider};
pub use sound::SoundSink;
pub use types::{Alert, AlertError, DispatchReport, NewsItem, NewsQuery};

use async_trait::async_trait;

/// Destination for dispatched alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs and dispatch reports
    fn name(&self) -> &str;
    /// Deliver one alert
    async fn notify(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// Source of news explaining a movement
#[async_trait]
pub trait NewsContextProvider: Send + Sync {
    async fn fetch_context(&self, query: &NewsQuery) -> anyhow::Result<Vec<NewsItem>>;
}
