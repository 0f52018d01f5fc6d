//! Opportunity scanner: fee-adjusted cross-venue arbitrage detection.
//!
//! For every unordered venue pair both directions are evaluated:
//! buy at V1's ask / sell at V2's bid, and the reverse. A direction is a
//! candidate only when the books are crossed across venues
//! (`buy.ask < sell.bid`); it is emitted only when the spread survives
//! fees and slippage on both legs.
//!
//! # Cost model
//! ```text
//! effective_buy  = ask × (1 + fee_buy + slippage_buy)
//! effective_sell = bid × (1 − fee_sell − slippage_sell)
//! net_profit     = effective_sell − effective_buy
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::VenueConfig;
use crate::core::types::{current_time_ms, Opportunity, Quote};

// =============================================================================
// Fee Schedule
// =============================================================================

/// Per-venue execution costs as fractions (0.001 = 0.10%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VenueCosts {
    pub fee_rate: f64,
    pub slippage_rate: f64,
}

impl VenueCosts {
    pub fn new(fee_rate: f64, slippage_rate: f64) -> Self {
        Self {
            fee_rate,
            slippage_rate,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.fee_rate + self.slippage_rate
    }
}

/// Venue → costs table. Venues missing from the table cost nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    costs: HashMap<Arc<str>, VenueCosts>,
}

impl FeeSchedule {
    pub fn empty() -> Self {
        Self {
            costs: HashMap::new(),
        }
    }

    /// Build from config, including disabled venues (their costs are harmless).
    pub fn from_venues(venues: &[VenueConfig]) -> Self {
        let mut schedule = Self::empty();
        for venue in venues {
            schedule.set(
                venue.id.as_str(),
                VenueCosts::new(venue.fee_rate, venue.slippage_rate),
            );
        }
        schedule
    }

    pub fn with(mut self, venue: &str, costs: VenueCosts) -> Self {
        self.set(venue, costs);
        self
    }

    pub fn set(&mut self, venue: &str, costs: VenueCosts) {
        self.costs.insert(Arc::from(venue), costs);
    }

    pub fn costs(&self, venue: &str) -> VenueCosts {
        self.costs.get(venue).copied().unwrap_or_default()
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::empty()
            .with("binance", VenueCosts::new(0.0010, 0.0002))
            .with("okx", VenueCosts::new(0.0010, 0.0002))
            .with("kraken", VenueCosts::new(0.0026, 0.0002))
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Crossed books that did not survive costs.
#[derive(Debug, Clone, PartialEq)]
pub struct MissedOpportunity {
    pub buy_venue: Arc<str>,
    pub sell_venue: Arc<str>,
    pub spread_percent: f64,
    pub net_profit_percent: f64,
}

/// Outcome of evaluating one direction (buy venue → sell venue).
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// `buy.ask >= sell.bid`
    NotCrossed,
    /// Crossed, but net profit after costs is `<= 0`
    Missed(MissedOpportunity),
    Profitable(Opportunity),
}

// =============================================================================
// Scanner
// =============================================================================

pub struct OpportunityScanner {
    fees: FeeSchedule,
    /// Quotes older than this are skipped. `None` treats every stored quote as current.
    max_quote_age_ms: Option<u64>,
}

impl OpportunityScanner {
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            fees,
            max_quote_age_ms: None,
        }
    }

    pub fn with_max_quote_age_ms(mut self, max_age_ms: Option<u64>) -> Self {
        self.max_quote_age_ms = max_age_ms;
        self
    }

    /// Scan a snapshot using the wall clock for staleness checks.
    pub fn scan(&self, snapshot: &[Quote]) -> Vec<Opportunity> {
        self.scan_at(snapshot, current_time_ms())
    }

    /// Scan a snapshot as of `now_ms`.
    ///
    /// Output order: venue pairs in ascending venue-id order, and within a
    /// pair the `V1 → V2` direction before `V2 → V1`.
    pub fn scan_at(&self, snapshot: &[Quote], now_ms: u64) -> Vec<Opportunity> {
        let mut eligible: Vec<&Quote> = snapshot
            .iter()
            .filter(|q| q.is_valid())
            .filter(|q| match self.max_quote_age_ms {
                Some(max_age) => {
                    let fresh = q.age_ms(now_ms) <= max_age;
                    if !fresh {
                        debug!(venue = %q.venue, age_ms = q.age_ms(now_ms), "[SCAN] Skipping stale quote");
                    }
                    fresh
                }
                None => true,
            })
            .collect();

        if eligible.len() < 2 {
            return Vec::new();
        }

        eligible.sort_by(|a, b| a.venue.cmp(&b.venue));

        let mut opportunities = Vec::new();
        for (i, first) in eligible.iter().enumerate() {
            for second in &eligible[i + 1..] {
                for (buy, sell) in [(*first, *second), (*second, *first)] {
                    match self.evaluate_at(buy, sell, now_ms) {
                        Evaluation::Profitable(opp) => opportunities.push(opp),
                        Evaluation::Missed(missed) => {
                            info!(
                                buy_venue = %missed.buy_venue,
                                sell_venue = %missed.sell_venue,
                                spread = format!("{:.4}%", missed.spread_percent),
                                net_profit = format!("{:.4}%", missed.net_profit_percent),
                                "[SCAN] Missed opportunity: spread does not cover fees"
                            );
                        }
                        Evaluation::NotCrossed => {}
                    }
                }
            }
        }

        opportunities
    }

    /// Evaluate buying at `buy.ask` and selling at `sell.bid`.
    pub fn evaluate(&self, buy: &Quote, sell: &Quote) -> Evaluation {
        self.evaluate_at(buy, sell, current_time_ms())
    }

    fn evaluate_at(&self, buy: &Quote, sell: &Quote, now_ms: u64) -> Evaluation {
        if !(buy.ask < sell.bid) {
            return Evaluation::NotCrossed;
        }

        let buy_costs = self.fees.costs(&buy.venue);
        let sell_costs = self.fees.costs(&sell.venue);

        let spread = sell.bid - buy.ask;
        let spread_percent = spread / buy.ask * 100.0;
        let effective_buy = buy.ask * (1.0 + buy_costs.total());
        let effective_sell = sell.bid * (1.0 - sell_costs.total());
        let net_profit = effective_sell - effective_buy;
        let net_profit_percent = net_profit / effective_buy * 100.0;

        if net_profit <= 0.0 {
            return Evaluation::Missed(MissedOpportunity {
                buy_venue: buy.venue.clone(),
                sell_venue: sell.venue.clone(),
                spread_percent,
                net_profit_percent,
            });
        }

        Evaluation::Profitable(Opportunity {
            buy_venue: buy.venue.clone(),
            sell_venue: sell.venue.clone(),
            symbol: buy.symbol.clone(),
            buy_price: buy.ask,
            sell_price: sell.bid,
            spread,
            spread_percent,
            buy_fee: buy_costs.fee_rate,
            sell_fee: sell_costs.fee_rate,
            buy_slippage: buy_costs.slippage_rate,
            sell_slippage: sell_costs.slippage_rate,
            effective_buy,
            effective_sell,
            net_profit,
            net_profit_percent,
            timestamp_ms: now_ms,
        })
    }
}

impl Default for OpportunityScanner {
    fn default() -> Self {
        Self::new(FeeSchedule::default())
    }
}
