//! Quote feed trait definition
//!
//! A `QuoteFeed` owns one venue connection: connect, subscribe, normalize
//! each top-of-book update into a [`Quote`](crate::core::Quote) and push it
//! through a [`QuoteSender`]. Reconnection is the feed manager's job.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::adapters::errors::ExchangeResult;
use crate::core::channels::QuoteSender;

/// Common trait for all venue feeds
///
/// # Example Implementation
///
/// ```ignore
/// #[async_trait]
/// impl QuoteFeed for MyFeed {
///     fn venue(&self) -> &str { "my-venue" }
///
///     async fn run(&mut self, tx: QuoteSender, shutdown: &mut broadcast::Receiver<()>) -> ExchangeResult<()> {
///         let mut ws = connect_tls(MY_URL).await?;
///         pump_quotes(&mut ws, self.venue(), &tx, shutdown, None, parse_my_message).await
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteFeed: Send {
    /// Venue id stamped on every emitted quote (e.g. "binance")
    fn venue(&self) -> &str;

    /// Venue-native symbol this feed subscribes to
    fn symbol(&self) -> &str;

    /// Stream quotes until shutdown or failure.
    ///
    /// Returns `Ok(())` only when shutdown was requested or the quote
    /// queue closed. A dropped connection is an error so the manager
    /// reconnects.
    async fn run(
        &mut self,
        tx: QuoteSender,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ExchangeResult<()>;
}
