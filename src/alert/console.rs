//! Console alert rendering

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::news::format_news_alert;
use super::types::Alert;
use super::AlertSink;

const RULE: &str = "==================================================";

/// Prints alerts to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn notify(&self, alert: &Alert) -> anyhow::Result<()> {
        println!("{}", format_alert(alert));
        Ok(())
    }
}

fn signed(value: Decimal) -> String {
    if value.is_sign_negative() {
        format!("{:.2}", value)
    } else {
        format!("+{:.2}", value)
    }
}

/// Human-readable alert block
pub fn format_alert(alert: &Alert) -> String {
    let m = &alert.movement;
    let mut lines = vec![String::new(), RULE.to_string()];

    lines.push(format!(
        "Alert time: {}",
        alert.raised_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    match &alert.name {
        Some(name) => lines.push(format!(
            "Instrument: {} ({}) [{}]",
            alert.instrument_id, name, alert.class
        )),
        None => lines.push(format!("Instrument: {} [{}]", alert.instrument_id, alert.class)),
    }
    lines.push(format!("Current price: ${:.2}", m.current_price));
    lines.push(format!(
        "Price change: ${} ({}%) since {}",
        signed(m.absolute_change),
        signed(m.percentage_change),
        m.window_start.format("%H:%M:%S")
    ));
    lines.push(format!("Trigger: {}", alert.reason));

    if let Some(price_change) = alert.display.price_change {
        lines.push(format!(
            "  Price threshold: ${:.2} (current: ${:.2})",
            price_change,
            m.absolute_change.abs()
        ));
    }
    if let Some(pct) = alert.display.percentage_change {
        lines.push(format!(
            "  Percentage threshold: {:.2}% (current: {:.2}%)",
            pct,
            m.percentage_change.abs()
        ));
    }

    if alert.context_requested {
        lines.push(String::new());
        lines.push(format_news_alert(&alert.instrument_id, &alert.context, m));
    }

    lines.push(RULE.to_string());
    lines.join("\n")
}
