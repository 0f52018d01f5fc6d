//! Reconnection backoff with jitter
//!
//! Exponential backoff (initial, 2×, 4×, ...) capped at `max_delay_ms`, plus
//! 0-199ms of random jitter.

use std::time::Duration;

use crate::config::constants::feed_max_reconnects;

/// Configuration for reconnection attempts
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Consecutive failures before the feed gives up
    pub max_attempts: u32,
    /// Initial delay in milliseconds (doubles each attempt)
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl ReconnectConfig {
    /// Defaults with `FEED_MAX_RECONNECTS` applied
    pub fn from_env() -> Self {
        Self {
            max_attempts: feed_max_reconnects(),
            ..Self::default()
        }
    }

    /// Delay before reconnect number `attempt` (0-based), without jitter
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    /// Delay before reconnect number `attempt` (0-based), with jitter
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = rand::random::<u64>() % 200;
        Duration::from_millis(self.base_delay_ms(attempt) + jitter)
    }
}
