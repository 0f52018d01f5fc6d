//! hft_arb: cross-venue arbitrage simulator
//!
//! Streams top-of-book quotes for one instrument from several venues,
//! scans for fee-adjusted cross-venue spreads and simulates fills on a
//! paper ledger:
//! - Venue feeds (Binance, OKX, Kraken) via WebSocket
//! - Quote book, opportunity scanner, execution ledger and scheduler loop
//! - Read-only HTTP monitoring API and a CLI status client
//! - Interactive stdin console for P&L and recent trades

pub mod adapters;
pub mod client;
pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod server;

pub use error::AppError;
