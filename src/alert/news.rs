//! News context from a chat-completions API
//!
//! Asks an OpenAI-compatible chat endpoint (DeepSeek by default) for the
//! breaking news most likely to explain a movement, then parses the reply
//! into structured items.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::types::{AlertError, NewsItem, NewsQuery};
use super::NewsContextProvider;
use crate::config::{NewsConfig, NEWS_API_KEY_ENV};
use crate::movement::{InstrumentClass, MovementResult};

const SYSTEM_PROMPT: &str = "You are a financial news analyst specializing in real-time market analysis. \
Your task is to search and analyze breaking news about financial markets and stocks. \
Please provide a concise summary of the most relevant and recent news, focusing on \
market-moving events that happened in the last 10 minutes.";

const FORMAT_INSTRUCTIONS: &str = "Format your response as a list of news items, each with a title, source, \
time, and brief summary. Only include factual, market-relevant information";

/// Longest summary shown in a news alert
const SUMMARY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// News provider backed by a chat-completions endpoint
pub struct ChatNewsProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatNewsProvider {
    pub fn new(config: &NewsConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("news API key missing; set {}", NEWS_API_KEY_ENV))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn user_prompt(query: &NewsQuery) -> String {
        match query.class {
            InstrumentClass::Index => format!(
                "Please analyze and summarize the most important breaking news in the last 10 minutes \
                 that could explain the current movement in {}. Focus on broad market news, including:\n\
                 1. Major economic events or data releases\n\
                 2. Global market trends and developments\n\
                 3. Political or policy changes affecting markets\n\
                 4. Significant sector-wide movements\n\
                 {} that could explain sudden market movements.",
                query.instrument_id, FORMAT_INSTRUCTIONS
            ),
            InstrumentClass::Stock => {
                let company = query
                    .name
                    .as_deref()
                    .map(|n| format!(" ({})", n))
                    .unwrap_or_default();
                format!(
                    "Please analyze and summarize the most important breaking news in the last 10 minutes \
                     for {} stock{}. Focus on:\n\
                     1. Company-specific news and announcements\n\
                     2. Industry-related developments\n\
                     3. Competitor activities that might affect the company\n\
                     4. Regulatory changes impacting the company or industry\n\
                     {} that could explain sudden stock price movements.",
                    query.instrument_id, company, FORMAT_INSTRUCTIONS
                )
            }
        }
    }

    fn build_request<'a>(&'a self, query: &NewsQuery) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(query),
                },
            ],
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

#[async_trait]
impl NewsContextProvider for ChatNewsProvider {
    async fn fetch_context(&self, query: &NewsQuery) -> anyhow::Result<Vec<NewsItem>> {
        tracing::debug!(instrument = %query.instrument_id, "Requesting news context");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::NewsApi { status, body }.into());
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        let items = parse_news_content(&content);
        tracing::debug!(instrument = %query.instrument_id, items = items.len(), "News context received");
        Ok(items)
    }
}

fn is_item_start(line: &str) -> bool {
    if line.starts_with("Title:") {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with('.')
}

fn extract_title(line: &str) -> String {
    let rest = match line.split_once(':') {
        Some((_, after)) => after,
        None => {
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            line[digits..].trim_start_matches('.')
        }
    };
    rest.trim().trim_matches('"').trim().to_string()
}

/// Parse a free-text reply into news items
///
/// An item starts at a `Title:` line or a numbered line (`1.`, `2.`, ...);
/// `Source:`, `Time:` and `Summary:` lines fill in the current item. Lines
/// before the first item are ignored.
pub fn parse_news_content(content: &str) -> Vec<NewsItem> {
    let mut items = Vec::new();
    let mut current: Option<NewsItem> = None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_item_start(line) {
            if let Some(item) = current.take() {
                items.push(item);
            }
            current = Some(NewsItem {
                title: extract_title(line),
                ..Default::default()
            });
            continue;
        }

        let Some(item) = current.as_mut() else {
            continue;
        };

        if let Some((_, after)) = line.split_once("Source:") {
            item.source = after.split('|').next().unwrap_or_default().trim().to_string();
            if let Some((_, time)) = line.split_once("Time:") {
                item.published_at = time.trim().to_string();
            }
        } else if let Some((_, time)) = line.split_once("Time:") {
            item.published_at = time.trim().to_string();
        } else if let Some((_, summary)) = line.split_once("Summary:") {
            item.summary = summary.trim().to_string();
        }
    }

    if let Some(item) = current {
        items.push(item);
    }
    items
}

fn preview(text: &str) -> String {
    if text.chars().count() <= SUMMARY_PREVIEW_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}

/// Price line followed by the news items explaining it
pub fn format_news_alert(instrument_id: &str, items: &[NewsItem], movement: &MovementResult) -> String {
    if items.is_empty() {
        return format!(
            "[ALERT] {} price movement detected but no relevant news found.",
            instrument_id
        );
    }

    let pct = movement.percentage_change;
    let sign = if pct.is_sign_negative() { "" } else { "+" };
    let mut lines = vec![
        format!(
            "[PRICE ALERT] {}: ${:.2} ({}{:.1}%)",
            instrument_id, movement.current_price, sign, pct
        ),
        String::new(),
        format!("[NEWS UPDATE] Found {} relevant news:", items.len()),
    ];

    for (i, item) in items.iter().enumerate() {
        lines.push(format!("{}. \"{}\"", i + 1, item.title));
        lines.push(format!(
            "   Source: {} | Time: {}",
            item.source, item.published_at
        ));
        lines.push(format!("   Summary: {}", preview(&item.summary)));
    }

    lines.join("\n")
}
