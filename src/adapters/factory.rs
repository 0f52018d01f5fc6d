//! Feed factory for config-driven venue selection
//!
//! Creates feeds from `VenueConfig` entries. Uses an enum-based dispatch
//! pattern (no `Box<dyn>`) so each venue's `run` stays monomorphized.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::adapters::binance::BinanceFeed;
use crate::adapters::errors::ExchangeResult;
use crate::adapters::kraken::KrakenFeed;
use crate::adapters::okx::OkxFeed;
use crate::adapters::traits::QuoteFeed;
use crate::config::{Venue, VenueConfig};
use crate::core::channels::QuoteSender;

// =============================================================================
// AnyFeed: enum-based dispatch for configured venues
// =============================================================================

/// Enum wrapping all concrete feed types for runtime dispatch.
pub enum AnyFeed {
    Binance(BinanceFeed),
    Okx(OkxFeed),
    Kraken(KrakenFeed),
}

/// Delegate a trait method to the wrapped feed
macro_rules! delegate {
    ($self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyFeed::Binance(f) => f.$method($($arg),*),
            AnyFeed::Okx(f) => f.$method($($arg),*),
            AnyFeed::Kraken(f) => f.$method($($arg),*),
        }
    };
}

#[async_trait]
impl QuoteFeed for AnyFeed {
    fn venue(&self) -> &str {
        delegate!(self, venue())
    }

    fn symbol(&self) -> &str {
        delegate!(self, symbol())
    }

    async fn run(
        &mut self,
        tx: QuoteSender,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ExchangeResult<()> {
        match self {
            AnyFeed::Binance(f) => f.run(tx, shutdown).await,
            AnyFeed::Okx(f) => f.run(tx, shutdown).await,
            AnyFeed::Kraken(f) => f.run(tx, shutdown).await,
        }
    }
}

/// Build the feed for one configured venue, honoring a `ws_url` override
pub fn create_feed(venue: &VenueConfig) -> AnyFeed {
    let url = venue.ws_url.as_deref();
    match venue.id {
        Venue::Binance => {
            let feed = BinanceFeed::new(&venue.symbol);
            AnyFeed::Binance(match url {
                Some(url) => feed.with_url(url),
                None => feed,
            })
        }
        Venue::Okx => {
            let feed = OkxFeed::new(&venue.symbol);
            AnyFeed::Okx(match url {
                Some(url) => feed.with_url(url),
                None => feed,
            })
        }
        Venue::Kraken => {
            let feed = KrakenFeed::new(&venue.symbol);
            AnyFeed::Kraken(match url {
                Some(url) => feed.with_url(url),
                None => feed,
            })
        }
    }
}

/// Feeds for every enabled venue, in config order
pub fn create_feeds(venues: &[VenueConfig]) -> Vec<AnyFeed> {
    venues.iter().filter(|v| v.enabled).map(create_feed).collect()
}
