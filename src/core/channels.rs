//! Inter-task channels: bounded quote ingestion and shutdown broadcast.
//!
//! Feeds never wait on the scheduler. [`QuoteSender::try_enqueue`] drops the
//! quote when the queue is full and counts the drop; the next quote from the
//! same venue supersedes it anyway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::broadcast;

use crate::core::types::Quote;

/// Default inbound quote queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Result of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted,
    /// Queue full, quote discarded
    Dropped,
    /// Receiver gone
    Closed,
}

#[derive(Debug, Default)]
struct QueueCounters {
    accepted: AtomicU64,
    dropped: AtomicU64,
}

/// Cloneable producer handle shared by all feeds.
#[derive(Debug, Clone)]
pub struct QuoteSender {
    tx: mpsc::Sender<Quote>,
    counters: Arc<QueueCounters>,
}

impl QuoteSender {
    /// Enqueue without waiting.
    pub fn try_enqueue(&self, quote: Quote) -> EnqueueOutcome {
        match self.tx.try_send(quote) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                EnqueueOutcome::Accepted
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
        }
    }

    /// Quotes discarded because the queue was full, across all clones
    pub fn dropped_count(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    pub fn accepted_count(&self) -> u64 {
        self.counters.accepted.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Bounded quote queue with drop accounting.
///
/// # Panics
/// Panics if `capacity` is zero (tokio's `mpsc::channel` contract); config
/// validation rejects that value.
pub fn quote_channel(capacity: usize) -> (QuoteSender, mpsc::Receiver<Quote>) {
    let (tx, rx) = mpsc::channel(capacity);
    let sender = QuoteSender {
        tx,
        counters: Arc::new(QueueCounters::default()),
    };
    (sender, rx)
}

/// Bundle of all inter-task communication channels
#[derive(Debug)]
pub struct ChannelBundle {
    /// Feeds -> SchedulerLoop: normalized quotes
    pub quote_tx: QuoteSender,
    pub quote_rx: mpsc::Receiver<Quote>,

    /// Shutdown broadcast: main -> all tasks
    pub shutdown_tx: broadcast::Sender<()>,
}

impl ChannelBundle {
    pub fn new(capacity: usize) -> Self {
        let (quote_tx, quote_rx) = quote_channel(capacity);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            quote_tx,
            quote_rx,
            shutdown_tx,
        }
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
