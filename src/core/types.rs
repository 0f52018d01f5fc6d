//! Core data types for the quote → opportunity → trade pipeline.
//!
//! Every value here is returned by copy from the book and ledger; none of
//! them hold references into shared state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Quote (top-of-book from a single venue)
// =============================================================================

/// Normalized top-of-book quote emitted by a venue feed.
///
/// Uses `Arc<str>` so cloning into the book and snapshots never reallocates ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Venue identifier (e.g. "binance", "okx", "kraken")
    pub venue: Arc<str>,
    /// Venue-native symbol
    pub symbol: Arc<str>,
    /// Best bid price
    pub bid: f64,
    /// Best ask price
    pub ask: f64,
    /// Observation time in milliseconds (epoch)
    pub timestamp_ms: u64,
}

impl Quote {
    pub fn new(venue: &str, symbol: &str, bid: f64, ask: f64, timestamp_ms: u64) -> Self {
        Self {
            venue: Arc::from(venue),
            symbol: Arc::from(symbol),
            bid,
            ask,
            timestamp_ms,
        }
    }

    /// Both sides finite and strictly positive. A crossed quote within one venue is still valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask > 0.0
    }

    /// Intra-venue spread as a percentage of the bid
    #[inline]
    pub fn spread_percent(&self) -> f64 {
        if self.bid == 0.0 {
            return 0.0;
        }
        (self.ask - self.bid) / self.bid * 100.0
    }

    /// Age relative to `now_ms`, zero if the quote is timestamped in the future
    #[inline]
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

// =============================================================================
// Opportunity
// =============================================================================

/// Profitable cross-venue trade: buy at `buy_venue`'s ask, sell at `sell_venue`'s bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub buy_venue: Arc<str>,
    pub sell_venue: Arc<str>,
    pub symbol: Arc<str>,
    /// Nominal buy price (buy venue ask)
    pub buy_price: f64,
    /// Nominal sell price (sell venue bid)
    pub sell_price: f64,
    /// sell_price - buy_price
    pub spread: f64,
    /// spread / buy_price * 100
    pub spread_percent: f64,
    pub buy_fee: f64,
    pub sell_fee: f64,
    pub buy_slippage: f64,
    pub sell_slippage: f64,
    /// buy_price * (1 + buy_fee + buy_slippage)
    pub effective_buy: f64,
    /// sell_price * (1 - sell_fee - sell_slippage)
    pub effective_sell: f64,
    /// effective_sell - effective_buy, always > 0
    pub net_profit: f64,
    /// net_profit / effective_buy * 100
    pub net_profit_percent: f64,
    pub timestamp_ms: u64,
}

// =============================================================================
// Trade
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Simulated fills never leave `Filled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Filled,
}

/// One leg of an executed round-trip. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub side: TradeSide,
    pub venue: Arc<str>,
    pub symbol: Arc<str>,
    pub price: f64,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    pub status: TradeStatus,
}

// =============================================================================
// P&L Status
// =============================================================================

/// Point-in-time view of the ledger, computed under the ledger lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnLStatus {
    pub current_balance: f64,
    pub initial_balance: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: f64,
    /// Trade legs, two per execution
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_rate: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub average_pnl: f64,
    pub last_update: DateTime<Utc>,
}

// =============================================================================
// Utility
// =============================================================================

/// Get current time in milliseconds since epoch.
#[inline]
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
