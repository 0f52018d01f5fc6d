//! Execution ledger: simulated fills, balance and running P&L statistics.
//!
//! A single mutex guards both mutation and every read, so a [`PnLStatus`]
//! always describes one instant of the ledger. All reads return copies.
//!
//! Sizing and realized P&L use the opportunity's nominal prices; fees and
//! slippage only decide *whether* an opportunity is taken (see the scanner).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::core::types::{Opportunity, PnLStatus, Trade, TradeSide, TradeStatus};

/// Errors surfaced by [`ExecutionLedger::execute`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("insufficient balance: {balance:.2} < {required:.2}")]
    InsufficientBalance { balance: f64, required: f64 },
}

#[derive(Debug)]
struct LedgerState {
    balance: f64,
    initial_balance: f64,
    trades: Vec<Trade>,
    /// Legs, always `2 × (winning_pairs + losing_pairs)`
    total_trades: u64,
    winning_pairs: u64,
    losing_pairs: u64,
    total_pnl: f64,
    largest_win: f64,
    largest_loss: f64,
    last_update: DateTime<Utc>,
}

/// Paper-trading ledger shared between the scheduler and the monitoring API.
#[derive(Debug)]
pub struct ExecutionLedger {
    state: Mutex<LedgerState>,
}

impl ExecutionLedger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                balance: initial_balance,
                initial_balance,
                trades: Vec::new(),
                total_trades: 0,
                winning_pairs: 0,
                losing_pairs: 0,
                total_pnl: 0.0,
                largest_win: 0.0,
                largest_loss: 0.0,
                last_update: Utc::now(),
            }),
        }
    }

    /// Simulate a BUY/SELL round-trip of `trade_size` notional.
    ///
    /// Fails without mutating anything when `balance < trade_size`.
    pub fn execute(&self, opportunity: &Opportunity, trade_size: f64) -> Result<(), LedgerError> {
        let mut state = self.state.lock();

        if state.balance < trade_size {
            return Err(LedgerError::InsufficientBalance {
                balance: state.balance,
                required: trade_size,
            });
        }

        let quantity = trade_size / opportunity.buy_price;
        let now = Utc::now();

        state.trades.push(Trade {
            id: Uuid::now_v7(),
            side: TradeSide::Buy,
            venue: opportunity.buy_venue.clone(),
            symbol: opportunity.symbol.clone(),
            price: opportunity.buy_price,
            quantity,
            timestamp: now,
            status: TradeStatus::Filled,
        });
        state.trades.push(Trade {
            id: Uuid::now_v7(),
            side: TradeSide::Sell,
            venue: opportunity.sell_venue.clone(),
            symbol: opportunity.symbol.clone(),
            price: opportunity.sell_price,
            quantity,
            timestamp: now,
            status: TradeStatus::Filled,
        });

        state.balance -= opportunity.buy_price * quantity;
        state.balance += opportunity.sell_price * quantity;

        let pnl = (opportunity.sell_price - opportunity.buy_price) * quantity;
        state.total_pnl += pnl;
        state.total_trades += 2;
        if pnl > 0.0 {
            state.winning_pairs += 1;
            state.largest_win = state.largest_win.max(pnl);
        } else {
            state.losing_pairs += 1;
            state.largest_loss = state.largest_loss.min(pnl);
        }
        state.last_update = now;

        info!(
            buy_venue = %opportunity.buy_venue,
            sell_venue = %opportunity.sell_venue,
            buy_price = opportunity.buy_price,
            sell_price = opportunity.sell_price,
            quantity = quantity,
            pnl = format!("{:.4}", pnl),
            pnl_percent = format!("{:.4}%", pnl / trade_size * 100.0),
            balance = format!("{:.2}", state.balance),
            "[TRADE] Executed arbitrage"
        );

        Ok(())
    }

    /// Derived statistics, computed under the ledger lock.
    ///
    /// Win rate and average P&L divide by legs (two per execution), so a ledger
    /// of only winning round-trips reports a 50% win rate.
    pub fn current_status(&self) -> PnLStatus {
        let state = self.state.lock();

        let legs = state.total_trades as f64;
        let (win_rate, average_pnl) = if state.total_trades > 0 {
            (state.winning_pairs as f64 / legs * 100.0, state.total_pnl / legs)
        } else {
            (0.0, 0.0)
        };

        let total_pnl_percent = if state.initial_balance != 0.0 {
            (state.balance - state.initial_balance) / state.initial_balance * 100.0
        } else {
            0.0
        };

        PnLStatus {
            current_balance: state.balance,
            initial_balance: state.initial_balance,
            total_pnl: state.total_pnl,
            total_pnl_percent,
            total_trades: state.total_trades,
            winning_trades: state.winning_pairs,
            losing_trades: state.losing_pairs,
            win_rate,
            largest_win: state.largest_win,
            largest_loss: state.largest_loss,
            average_pnl,
            last_update: state.last_update,
        }
    }

    /// The most recent `limit` trades, oldest first.
    ///
    /// `limit <= 0` or larger than the history returns everything.
    pub fn trade_history(&self, limit: i64) -> Vec<Trade> {
        let state = self.state.lock();
        let len = state.trades.len();
        let take = usize::try_from(limit)
            .ok()
            .filter(|&n| n > 0 && n < len)
            .unwrap_or(len);
        state.trades[len - take..].to_vec()
    }

    pub fn summary(&self) -> String {
        format_summary(&self.current_status())
    }

    pub fn balance(&self) -> f64 {
        self.state.lock().balance
    }

    /// Number of trade legs recorded
    pub fn trade_count(&self) -> usize {
        self.state.lock().trades.len()
    }
}

/// `P&L: $x.xx (y.yy%) | Trades: n | Win Rate: z.z%`
pub fn format_summary(status: &PnLStatus) -> String {
    format!(
        "P&L: ${:.2} ({:.2}%) | Trades: {} | Win Rate: {:.1}%",
        status.total_pnl, status.total_pnl_percent, status.total_trades, status.win_rate
    )
}
