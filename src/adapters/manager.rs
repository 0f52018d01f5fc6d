//! Feed manager: one task per venue feed, with reconnect backoff.
//!
//! Tasks are tracked on a `TaskTracker` so shutdown can wait for every
//! feed to drop its `QuoteSender`; once all senders are gone the scheduler
//! drains the queue and exits.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::adapters::shared::ReconnectConfig;
use crate::adapters::traits::QuoteFeed;
use crate::core::channels::QuoteSender;

/// Why a feed task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedExit {
    /// Shutdown requested or quote queue closed
    Stopped,
    /// `max_attempts` consecutive failures
    GaveUp,
}

pub struct FeedManager {
    tracker: TaskTracker,
    shutdown_tx: broadcast::Sender<()>,
    reconnect: ReconnectConfig,
}

impl FeedManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, reconnect: ReconnectConfig) -> Self {
        Self {
            tracker: TaskTracker::new(),
            shutdown_tx,
            reconnect,
        }
    }

    /// Spawn one feed. The shutdown subscription is taken before the task
    /// starts, so a shutdown sent right after `spawn` is never missed.
    pub fn spawn<F>(&self, feed: F, tx: QuoteSender)
    where
        F: QuoteFeed + 'static,
    {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let reconnect = self.reconnect.clone();
        self.tracker.spawn(async move {
            run_feed(feed, tx, shutdown_rx, reconnect).await;
        });
    }

    pub fn spawn_all<F, I>(&self, feeds: I, tx: &QuoteSender)
    where
        F: QuoteFeed + 'static,
        I: IntoIterator<Item = F>,
    {
        let mut venues = Vec::new();
        for feed in feeds {
            venues.push(feed.venue().to_string());
            self.spawn(feed, tx.clone());
        }
        info!(venues = ?venues, "All venue feeds launched");
    }

    /// Number of feed tasks still running
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every feed task to finish (call after broadcasting shutdown).
    pub async fn wait(self) {
        self.tracker.close();
        self.tracker.wait().await;
        info!("[SHUTDOWN] All venue feeds stopped");
    }
}

/// Drive one feed until shutdown or until reconnects are exhausted.
///
/// Shutdown is raced against the whole of `feed.run`, connect included, so a
/// venue stuck mid-handshake cannot hold up `FeedManager::wait`. A connection
/// that stayed up for at least `max_delay_ms` resets the failure count.
pub async fn run_feed<F>(
    mut feed: F,
    tx: QuoteSender,
    mut shutdown_rx: broadcast::Receiver<()>,
    reconnect: ReconnectConfig,
) -> FeedExit
where
    F: QuoteFeed,
{
    let venue = feed.venue().to_string();
    let symbol = feed.symbol().to_string();
    let stable_after = Duration::from_millis(reconnect.max_delay_ms);
    let mut attempt: u32 = 0;
    // Second cursor on the same channel: `feed.run` borrows `shutdown_rx`
    let mut stop = shutdown_rx.resubscribe();

    info!(venue = %venue, symbol = %symbol, "[FEED] Starting");

    loop {
        // Shutdown sent before `stop` existed is only visible here
        match shutdown_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Lagged(_)) | Err(TryRecvError::Closed) => {
                info!(venue = %venue, "[FEED] Shutdown before connect");
                return FeedExit::Stopped;
            }
            Err(TryRecvError::Empty) => {}
        }

        let started = Instant::now();
        let result = tokio::select! {
            result = feed.run(tx.clone(), &mut shutdown_rx) => result,
            _ = stop.recv() => {
                info!(venue = %venue, "[FEED] Shutdown while connecting or streaming");
                return FeedExit::Stopped;
            }
        };

        match result {
            Ok(()) => {
                info!(venue = %venue, "[FEED] Stopped");
                return FeedExit::Stopped;
            }
            Err(e) => {
                if started.elapsed() >= stable_after {
                    attempt = 0;
                }
                if attempt >= reconnect.max_attempts {
                    error!(
                        venue = %venue,
                        error = %e,
                        attempts = attempt,
                        "[FEED] Giving up after repeated failures"
                    );
                    return FeedExit::GaveUp;
                }

                let delay = reconnect.delay(attempt);
                attempt += 1;
                warn!(
                    venue = %venue,
                    error = %e,
                    attempt,
                    max_attempts = reconnect.max_attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    "[FEED] Feed failed, reconnecting after backoff"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stop.recv() => {
                        info!(venue = %venue, "[FEED] Shutdown during backoff");
                        return FeedExit::Stopped;
                    }
                }
            }
        }
    }
}
