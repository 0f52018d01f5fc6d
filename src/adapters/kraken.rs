//! Kraken public feed (v1 `spread` channel)
//!
//! Data frames are JSON arrays:
//! `[channelID, ["bid", "ask", "timestamp", "bidVolume", "askVolume"], "spread", "DOGE/USD"]`
//! with the timestamp in fractional seconds. Everything else is an object
//! event (heartbeat, systemStatus, subscriptionStatus).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::{connect_tls, pump_quotes, send_json};
use crate::adapters::traits::QuoteFeed;
use crate::core::channels::QuoteSender;
use crate::core::types::{current_time_ms, Quote};

pub const KRAKEN_WS_URL: &str = "wss://ws.kraken.com";

#[derive(Debug, Deserialize)]
pub struct KrakenEvent {
    pub event: String,
    pub status: Option<String>,
    pub pair: Option<String>,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KrakenMessage {
    /// `[channelID, payload, channelName, pair]`
    Data(serde_json::Value, Vec<String>, String, String),
    Event(KrakenEvent),
}

pub fn subscribe_message(pair: &str) -> serde_json::Value {
    json!({
        "event": "subscribe",
        "pair": [pair],
        "subscription": { "name": "spread" }
    })
}

/// Parse one Kraken frame.
pub fn parse_message(venue: &str, pair: &str, text: &str) -> ExchangeResult<Option<Quote>> {
    let msg: KrakenMessage = serde_json::from_str(text)
        .map_err(|e| ExchangeError::InvalidResponse(format!("kraken: {}", e)))?;

    match msg {
        KrakenMessage::Event(event) => {
            if event.event == "subscriptionStatus" && event.status.as_deref() == Some("error") {
                return Err(ExchangeError::SubscriptionFailed {
                    symbol: event.pair.unwrap_or_else(|| pair.to_string()),
                    reason: event.error_message.unwrap_or_default(),
                });
            }
            Ok(None)
        }
        KrakenMessage::Data(_, payload, channel, data_pair) => {
            if channel != "spread" {
                return Ok(None);
            }
            if payload.len() < 3 {
                return Err(ExchangeError::InvalidResponse(format!(
                    "kraken: spread payload has {} fields",
                    payload.len()
                )));
            }
            let bid = parse_field(&payload[0], "bid")?;
            let ask = parse_field(&payload[1], "ask")?;
            let timestamp_ms = payload[2]
                .parse::<f64>()
                .map(|secs| (secs * 1000.0) as u64)
                .unwrap_or_else(|_| current_time_ms());

            Ok(Some(Quote::new(venue, &data_pair, bid, ask, timestamp_ms)))
        }
    }
}

fn parse_field(raw: &str, name: &str) -> ExchangeResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| ExchangeError::InvalidResponse(format!("kraken: bad {} '{}'", name, raw)))
}

pub struct KrakenFeed {
    pair: String,
    url: String,
}

impl KrakenFeed {
    pub fn new(pair: &str) -> Self {
        Self {
            pair: pair.to_string(),
            url: KRAKEN_WS_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl QuoteFeed for KrakenFeed {
    fn venue(&self) -> &str {
        "kraken"
    }

    fn symbol(&self) -> &str {
        &self.pair
    }

    async fn run(
        &mut self,
        tx: QuoteSender,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ExchangeResult<()> {
        let mut ws = connect_tls(&self.url).await?;
        send_json(&mut ws, &subscribe_message(&self.pair)).await?;
        info!(venue = "kraken", pair = %self.pair, "[FEED] Connected and subscribed");

        let pair = self.pair.clone();
        pump_quotes(&mut ws, "kraken", &tx, shutdown, None, |text| {
            parse_message("kraken", &pair, text)
        })
        .await
    }
}
