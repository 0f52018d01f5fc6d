//! Core module - quote book, opportunity scanner, execution ledger and scheduler
//!
//! # Module Architecture
//!
//! This module uses **explicit re-exports** instead of glob exports (`pub use module::*`)
//! so the public surface only changes on purpose.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{QuoteBook, OpportunityScanner, ExecutionLedger, SchedulerLoop};
//! ```

pub mod channels;
pub mod ledger;
pub mod quote_book;
pub mod scanner;
pub mod scheduler;
pub mod types;

pub use types::{
    current_time_ms, Opportunity, PnLStatus, Quote, Trade, TradeSide, TradeStatus,
};

pub use channels::{
    quote_channel, ChannelBundle, EnqueueOutcome, QuoteSender, DEFAULT_QUEUE_CAPACITY,
};
pub use ledger::{format_summary, ExecutionLedger, LedgerError};
pub use quote_book::QuoteBook;
pub use scanner::{Evaluation, FeeSchedule, MissedOpportunity, OpportunityScanner, VenueCosts};
pub use scheduler::{ScanOutcome, SchedulerLoop, SchedulerSettings, SchedulerStats};
