//! Binance spot feed (`<symbol>@bookTicker` stream)
//!
//! The single-stream endpoint pushes every best bid/ask change; no
//! subscription frame is needed.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::{connect_tls, pump_quotes};
use crate::adapters::traits::QuoteFeed;
use crate::core::channels::QuoteSender;
use crate::core::types::{current_time_ms, Quote};

pub const BINANCE_WS_BASE: &str = "wss://stream.binance.com:9443/ws";

/// bookTicker payload; prices arrive as strings
#[derive(Debug, Deserialize)]
pub struct BookTicker {
    #[serde(rename = "u")]
    pub update_id: Option<u64>,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b")]
    pub bid_price: String,
    #[serde(rename = "B")]
    pub bid_qty: String,
    #[serde(rename = "a")]
    pub ask_price: String,
    #[serde(rename = "A")]
    pub ask_qty: String,
}

pub fn stream_url(symbol: &str) -> String {
    format!("{}/{}@bookTicker", BINANCE_WS_BASE, symbol.to_lowercase())
}

/// Parse one bookTicker frame. Binance omits a timestamp, so receive time is used.
pub fn parse_book_ticker(venue: &str, text: &str) -> ExchangeResult<Option<Quote>> {
    let ticker: BookTicker = serde_json::from_str(text)
        .map_err(|e| ExchangeError::InvalidResponse(format!("binance bookTicker: {}", e)))?;

    let bid = parse_price(&ticker.bid_price)?;
    let ask = parse_price(&ticker.ask_price)?;

    Ok(Some(Quote::new(venue, &ticker.symbol, bid, ask, current_time_ms())))
}

fn parse_price(raw: &str) -> ExchangeResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| ExchangeError::InvalidResponse(format!("binance price '{}'", raw)))
}

pub struct BinanceFeed {
    symbol: String,
    url: String,
}

impl BinanceFeed {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            url: stream_url(symbol),
        }
    }

    /// Point at a different endpoint (tests, testnet)
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl QuoteFeed for BinanceFeed {
    fn venue(&self) -> &str {
        "binance"
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
        info!(venue = "binance", symbol = %self.symbol, url = %self.url, "[FEED] Connected");

        pump_quotes(&mut ws, "binance", &tx, shutdown, None, |text| {
            parse_book_ticker("binance", text)
        })
        .await
    }
}
