//! Quote book: latest top-of-book quote per venue.
//!
//! One writer per venue feed (through the scheduler) and periodic readers
//! (scan tick, monitoring API). Writers replace a whole `Quote` under the
//! write lock, so a snapshot never sees fields from two different writes.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::types::Quote;

/// Concurrency-safe `venue → latest Quote` map.
#[derive(Debug, Default)]
pub struct QuoteBook {
    quotes: RwLock<HashMap<Arc<str>, Quote>>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored quote for `quote.venue` (last write wins).
    ///
    /// Returns `false` without touching the book when bid or ask is not positive.
    pub fn upsert(&self, quote: Quote) -> bool {
        if !quote.is_valid() {
            return false;
        }
        self.quotes.write().insert(quote.venue.clone(), quote);
        true
    }

    /// Independent copy of every stored quote, sorted by venue id.
    pub fn snapshot(&self) -> Vec<Quote> {
        let mut quotes: Vec<Quote> = self.quotes.read().values().cloned().collect();
        quotes.sort_by(|a, b| a.venue.cmp(&b.venue));
        quotes
    }

    pub fn get(&self, venue: &str) -> Option<Quote> {
        self.quotes.read().get(venue).cloned()
    }

    pub fn len(&self) -> usize {
        self.quotes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.read().is_empty()
    }

    /// One line per venue: `venue: Bid=.. Ask=.. Spread=..%`
    pub fn summary(&self) -> String {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return "No quotes".to_string();
        }

        let mut out = String::new();
        for quote in &snapshot {
            let _ = writeln!(
                out,
                "{}: Bid={:.6}, Ask={:.6}, Spread={:.4}%",
                quote.venue,
                quote.bid,
                quote.ask,
                quote.spread_percent()
            );
        }
        out.truncate(out.trim_end().len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_upsert_and_get() {
        let book = QuoteBook::new();
        assert!(book.upsert(Quote::new("binance", "dogeusdt", 0.10, 0.11, 1)));
        let quote = book.get("binance").unwrap();
        assert_eq!(quote.bid, 0.10);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let book = QuoteBook::new();
        book.upsert(Quote::new("okx", "DOGE-USDT", 1.0, 1.1, 1));
        book.upsert(Quote::new("okx", "DOGE-USDT", 2.0, 2.1, 2));
        assert_eq!(book.len(), 1);
        assert_eq!(book.get("okx").unwrap().bid, 2.0);
    }

    #[test]
    fn test_invalid_quote_rejected() {
        let book = QuoteBook::new();
        book.upsert(Quote::new("kraken", "DOGE/USD", 1.0, 1.1, 1));
        assert!(!book.upsert(Quote::new("kraken", "DOGE/USD", 0.0, 1.1, 2)));
        assert!(!book.upsert(Quote::new("okx", "DOGE-USDT", 1.0, -1.0, 2)));
        // Previous valid quote survives
        assert_eq!(book.get("kraken").unwrap().timestamp_ms, 1);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_non_finite_quote_rejected() {
        let book = QuoteBook::new();
        book.upsert(Quote::new("binance", "dogeusdt", 1.0, 1.1, 1));
        assert!(!book.upsert(Quote::new("binance", "dogeusdt", f64::INFINITY, f64::INFINITY, 2)));
        assert!(!book.upsert(Quote::new("binance", "dogeusdt", f64::NAN, 1.1, 3)));
        assert_eq!(book.get("binance").unwrap().bid, 1.0);
    }

    #[test]
    fn test_snapshot_is_sorted_and_independent() {
        let book = QuoteBook::new();
        book.upsert(Quote::new("okx", "DOGE-USDT", 1.0, 1.1, 1));
        book.upsert(Quote::new("binance", "dogeusdt", 1.0, 1.1, 1));
        book.upsert(Quote::new("kraken", "DOGE/USD", 1.0, 1.1, 1));

        let snapshot = book.snapshot();
        let venues: Vec<&str> = snapshot.iter().map(|q| &*q.venue).collect();
        assert_eq!(venues, vec!["binance", "kraken", "okx"]);

        book.upsert(Quote::new("okx", "DOGE-USDT", 5.0, 5.1, 2));
        assert_eq!(snapshot[2].bid, 1.0);
    }

    #[test]
    fn test_empty_book() {
        let book = QuoteBook::new();
        assert!(book.is_empty());
        assert!(book.snapshot().is_empty());
        assert_eq!(book.summary(), "No quotes");
    }

    #[test]
    fn test_summary_lists_each_venue() {
        let book = QuoteBook::new();
        book.upsert(Quote::new("binance", "dogeusdt", 100.0, 101.0, 1));
        book.upsert(Quote::new("okx", "DOGE-USDT", 100.0, 100.5, 1));
        let summary = book.summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "binance: Bid=100.000000, Ask=101.000000, Spread=1.0000%");
        assert!(lines[1].starts_with("okx: "));
    }

    #[test]
    fn test_concurrent_upserts_distinct_venues() {
        let book = Arc::new(QuoteBook::new());
        let writers = 8;
        let writes_per_venue = 500u64;

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let book = book.clone();
                thread::spawn(move || {
                    let venue = format!("venue-{}", i);
                    for n in 1..=writes_per_venue {
                        let price = n as f64;
                        book.upsert(Quote::new(&venue, "X", price, price + 0.5, n));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(book.len(), writers);
        for i in 0..writers {
            let quote = book.get(&format!("venue-{}", i)).unwrap();
            assert_eq!(quote.timestamp_ms, writes_per_venue);
            assert_eq!(quote.bid, writes_per_venue as f64);
        }
    }

    #[test]
    fn test_snapshot_never_torn() {
        // Every write keeps bid == ts, ask == ts + 0.5; a torn read would break that.
        let book = Arc::new(QuoteBook::new());
        let writer_book = book.clone();
        let writer = thread::spawn(move || {
            for n in 1..=5_000u64 {
                let price = n as f64;
                writer_book.upsert(Quote::new("binance", "X", price, price + 0.5, n));
                writer_book.upsert(Quote::new("okx", "X", price, price + 0.5, n));
            }
        });

        for _ in 0..2_000 {
            for quote in book.snapshot() {
                assert_eq!(quote.bid, quote.timestamp_ms as f64);
                assert_eq!(quote.ask, quote.bid + 0.5);
            }
        }

        writer.join().unwrap();
    }
}
