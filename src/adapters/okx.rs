//! OKX public feed (`books5` channel)
//!
//! Each push carries the top five levels; only level 0 is used.
//! OKX drops idle connections after 30s, so a text `ping` is sent every 20s.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::{connect_tls, pump_quotes, send_json, Heartbeat};
use crate::adapters::traits::QuoteFeed;
use crate::core::channels::QuoteSender;
use crate::core::types::{current_time_ms, Quote};

pub const OKX_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";
const OKX_CHANNEL: &str = "books5";

#[derive(Debug, Deserialize)]
pub struct OkxArg {
    pub channel: Option<String>,
    #[serde(rename = "instId")]
    pub inst_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OkxBook {
    /// `[price, size, deprecated, order_count]`
    pub bids: Vec<Vec<String>>,
    pub asks: Vec<Vec<String>>,
    #[serde(rename = "instId")]
    pub inst_id: Option<String>,
    pub ts: Option<String>,
}

/// Envelope for both event frames and data pushes
#[derive(Debug, Deserialize)]
pub struct OkxMessage {
    pub event: Option<String>,
    pub code: Option<String>,
    pub msg: Option<String>,
    pub arg: Option<OkxArg>,
    pub data: Option<Vec<OkxBook>>,
}

pub fn subscribe_message(inst_id: &str) -> serde_json::Value {
    json!({
        "op": "subscribe",
        "args": [{ "channel": OKX_CHANNEL, "instId": inst_id }]
    })
}

/// Parse one OKX frame.
///
/// `pong` and subscribe acks yield `None`; an `error` event fails the subscription.
pub fn parse_message(venue: &str, symbol: &str, text: &str) -> ExchangeResult<Option<Quote>> {
    if text == "pong" {
        return Ok(None);
    }

    let msg: OkxMessage = serde_json::from_str(text)
        .map_err(|e| ExchangeError::InvalidResponse(format!("okx: {}", e)))?;

    match msg.event.as_deref() {
        Some("error") => {
            return Err(ExchangeError::SubscriptionFailed {
                symbol: symbol.to_string(),
                reason: format!(
                    "{} (code {})",
                    msg.msg.unwrap_or_default(),
                    msg.code.unwrap_or_default()
                ),
            })
        }
        Some(_) => return Ok(None),
        None => {}
    }

    let book = match msg.data.and_then(|d| d.into_iter().next()) {
        Some(b) => b,
        None => return Err(ExchangeError::InvalidResponse("okx: push without data".into())),
    };

    let bid = top_price(&book.bids, "bid")?;
    let ask = top_price(&book.asks, "ask")?;
    let timestamp_ms = book
        .ts
        .as_deref()
        .and_then(|ts| ts.parse::<u64>().ok())
        .unwrap_or_else(current_time_ms);
    let inst_id = book
        .inst_id
        .or_else(|| msg.arg.and_then(|a| a.inst_id))
        .unwrap_or_else(|| symbol.to_string());

    Ok(Some(Quote::new(venue, &inst_id, bid, ask, timestamp_ms)))
}

fn top_price(levels: &[Vec<String>], side: &str) -> ExchangeResult<f64> {
    levels
        .first()
        .and_then(|level| level.first())
        .and_then(|p| p.parse::<f64>().ok())
        .ok_or_else(|| ExchangeError::InvalidResponse(format!("okx: missing top {}", side)))
}

pub struct OkxFeed {
    symbol: String,
    url: String,
}

impl OkxFeed {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            url: OKX_WS_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl QuoteFeed for OkxFeed {
    fn venue(&self) -> &str {
        "okx"
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn run(
        &mut self,
        tx: QuoteSender,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ExchangeResult<()> {
        let mut ws = connect_tls(&self.url).await?;
        send_json(&mut ws, &subscribe_message(&self.symbol)).await?;
        info!(venue = "okx", symbol = %self.symbol, channel = OKX_CHANNEL, "[FEED] Connected and subscribed");

        let heartbeat = Heartbeat {
            interval: Duration::from_secs(20),
            payload: "ping".to_string(),
        };
        let symbol = self.symbol.clone();
        pump_quotes(&mut ws, "okx", &tx, shutdown, Some(heartbeat), |text| {
            parse_message("okx", &symbol, text)
        })
        .await
    }
}
