//! Venue feeds for top-of-book quotes
//!
//! Each feed connects over WebSocket, normalizes venue messages into
//! [`Quote`](crate::core::Quote) values and hands them to the scheduler's
//! bounded queue.

pub mod binance;
pub mod errors;
pub mod factory;
pub mod kraken;
pub mod manager;
pub mod okx;
pub mod shared;
pub mod traits;

// Re-export commonly used types for convenience
pub use binance::BinanceFeed;
pub use errors::{ExchangeError, ExchangeResult};
pub use factory::{create_feed, create_feeds, AnyFeed};
pub use kraken::KrakenFeed;
pub use manager::{FeedExit, FeedManager};
pub use okx::OkxFeed;
pub use shared::ReconnectConfig;
pub use traits::QuoteFeed;
