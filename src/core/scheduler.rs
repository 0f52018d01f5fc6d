//! Scheduler loop: quote ingestion, periodic scan/execute, periodic report.
//!
//! # Event sources
//! - inbound quotes: applied to the book immediately
//! - scan tick: snapshot → scan → execute each opportunity in order
//! - report tick: log ledger status
//!
//! The `select!` is unbiased, so when several sources are ready together
//! tokio picks one at random. Each branch runs to completion before the
//! next poll; a scan or report is never abandoned half-way.
//!
//! The loop ends when every [`QuoteSender`](crate::core::QuoteSender) has
//! been dropped and the queue is drained.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::ledger::ExecutionLedger;
use crate::core::quote_book::QuoteBook;
use crate::core::scanner::OpportunityScanner;
use crate::core::types::Quote;

/// Cadence and sizing for [`SchedulerLoop`]
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub scan_interval: Duration,
    pub report_interval: Duration,
    /// Notional passed to every `execute`
    pub trade_size: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(100),
            report_interval: Duration::from_secs(5),
            trade_size: 100.0,
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            scan_interval: config.scheduler.scan_interval(),
            report_interval: config.scheduler.report_interval(),
            trade_size: config.ledger.trade_size,
        }
    }
}

/// Counters returned when the loop exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub quotes_ingested: u64,
    /// Non-positive bid/ask, filtered at the book
    pub quotes_rejected: u64,
    pub scans: u64,
    pub opportunities: u64,
    pub executions: u64,
    /// `InsufficientBalance` refusals
    pub rejected_executions: u64,
    pub reports: u64,
}

/// Result of a single scan tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub opportunities: u64,
    pub executed: u64,
    pub rejected: u64,
}

pub struct SchedulerLoop {
    book: Arc<QuoteBook>,
    scanner: OpportunityScanner,
    ledger: Arc<ExecutionLedger>,
    settings: SchedulerSettings,
}

impl SchedulerLoop {
    pub fn new(
        book: Arc<QuoteBook>,
        scanner: OpportunityScanner,
        ledger: Arc<ExecutionLedger>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            book,
            scanner,
            ledger,
            settings,
        }
    }

    /// Run until the quote channel closes, then emit a final report.
    pub async fn run(self, mut quote_rx: mpsc::Receiver<Quote>) -> SchedulerStats {
        let mut stats = SchedulerStats::default();

        // First ticks fire one full period after start
        let mut scan_tick = interval_at(
            Instant::now() + self.settings.scan_interval,
            self.settings.scan_interval,
        );
        scan_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut report_tick = interval_at(
            Instant::now() + self.settings.report_interval,
            self.settings.report_interval,
        );
        report_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            scan_interval_ms = self.settings.scan_interval.as_millis() as u64,
            report_interval_ms = self.settings.report_interval.as_millis() as u64,
            trade_size = self.settings.trade_size,
            "Scheduler loop started"
        );

        loop {
            tokio::select! {
                maybe_quote = quote_rx.recv() => {
                    match maybe_quote {
                        Some(quote) => self.ingest(quote, &mut stats),
                        None => {
                            info!("[SHUTDOWN] Quote channel closed, scheduler exiting");
                            break;
                        }
                    }
                }
                _ = scan_tick.tick() => {
                    let outcome = self.scan_once();
                    stats.scans += 1;
                    stats.opportunities += outcome.opportunities;
                    stats.executions += outcome.executed;
                    stats.rejected_executions += outcome.rejected;
                }
                _ = report_tick.tick() => {
                    self.report();
                    stats.reports += 1;
                }
            }
        }

        self.report();
        stats.reports += 1;

        info!(
            quotes_ingested = stats.quotes_ingested,
            quotes_rejected = stats.quotes_rejected,
            scans = stats.scans,
            opportunities = stats.opportunities,
            executions = stats.executions,
            rejected_executions = stats.rejected_executions,
            "Scheduler loop stopped"
        );

        stats
    }

    fn ingest(&self, quote: Quote, stats: &mut SchedulerStats) {
        let venue = quote.venue.clone();
        if self.book.upsert(quote) {
            stats.quotes_ingested += 1;
        } else {
            stats.quotes_rejected += 1;
            debug!(venue = %venue, "Ignoring quote with non-positive bid/ask");
        }
    }

    /// Snapshot the book, scan it and execute every opportunity in order.
    ///
    /// A refused execution is logged and the remaining opportunities still run.
    pub fn scan_once(&self) -> ScanOutcome {
        let snapshot = self.book.snapshot();
        let opportunities = self.scanner.scan(&snapshot);
        let mut outcome = ScanOutcome {
            opportunities: opportunities.len() as u64,
            ..ScanOutcome::default()
        };

        for opportunity in &opportunities {
            info!(
                buy_venue = %opportunity.buy_venue,
                sell_venue = %opportunity.sell_venue,
                buy_price = opportunity.buy_price,
                sell_price = opportunity.sell_price,
                spread = format!("{:.4}%", opportunity.spread_percent),
                net_profit = format!("{:.4}%", opportunity.net_profit_percent),
                "[SCAN] Arbitrage opportunity"
            );

            match self.ledger.execute(opportunity, self.settings.trade_size) {
                Ok(()) => outcome.executed += 1,
                Err(e) => {
                    outcome.rejected += 1;
                    warn!(
                        buy_venue = %opportunity.buy_venue,
                        sell_venue = %opportunity.sell_venue,
                        error = %e,
                        "[TRADE] Execution refused"
                    );
                }
            }
        }

        outcome
    }

    /// Log the current ledger status and quote book.
    pub fn report(&self) {
        let status = self.ledger.current_status();
        info!(
            balance = format!("{:.2}", status.current_balance),
            total_pnl = format!("{:.4}", status.total_pnl),
            total_pnl_percent = format!("{:.4}%", status.total_pnl_percent),
            total_trades = status.total_trades,
            winning = status.winning_trades,
            losing = status.losing_trades,
            win_rate = format!("{:.1}%", status.win_rate),
            largest_win = status.largest_win,
            largest_loss = status.largest_loss,
            summary = %self.ledger.summary(),
            "[REPORT] Ledger status"
        );
        debug!(quotes = %self.book.summary(), "[REPORT] Quote book");
    }
}
