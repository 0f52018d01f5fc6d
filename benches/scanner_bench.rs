use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hft_arb::core::{ExecutionLedger, FeeSchedule, OpportunityScanner, Quote, QuoteBook};

fn make_snapshot(venues: usize, crossed: bool) -> Vec<Quote> {
    (0..venues)
        .map(|i| {
            let offset = i as f64 * 0.0001;
            let (bid, ask) = if crossed && i == venues - 1 {
                (0.0800, 0.0801)
            } else {
                (0.0785 + offset, 0.0786 + offset)
            };
            Quote::new(&format!("venue{:02}", i), "DOGE", bid, ask, 0)
        })
        .collect()
}

fn bench_scan_three_venues(c: &mut Criterion) {
    c.bench_function("scan_3_venues", |b| {
        let scanner = OpportunityScanner::default();
        let snapshot = vec![
            Quote::new("binance", "dogeusdt", 0.07850, 0.07860, 0),
            Quote::new("kraken", "DOGE/USD", 0.07990, 0.08000, 0),
            Quote::new("okx", "DOGE-USDT", 0.07848, 0.07858, 0),
        ];

        b.iter(|| {
            black_box(scanner.scan_at(black_box(&snapshot), 0));
        });
    });
}

fn bench_scan_twenty_venues(c: &mut Criterion) {
    c.bench_function("scan_20_venues", |b| {
        let scanner = OpportunityScanner::new(FeeSchedule::empty());
        let snapshot = make_snapshot(20, true);

        b.iter(|| {
            black_box(scanner.scan_at(black_box(&snapshot), 0));
        });
    });
}

fn bench_book_upsert_snapshot(c: &mut Criterion) {
    c.bench_function("book_upsert_snapshot", |b| {
        let book = QuoteBook::new();
        let quotes = make_snapshot(3, false);

        b.iter(|| {
            for q in &quotes {
                book.upsert(black_box(q.clone()));
            }
            black_box(book.snapshot());
        });
    });
}

fn bench_ledger_execute(c: &mut Criterion) {
    c.bench_function("ledger_execute", |b| {
        let scanner = OpportunityScanner::default();
        let snapshot = vec![
            Quote::new("binance", "dogeusdt", 0.07850, 0.07860, 0),
            Quote::new("kraken", "DOGE/USD", 0.07990, 0.08000, 0),
        ];
        let opportunity = scanner.scan_at(&snapshot, 0).remove(0);
        let ledger = Arc::new(ExecutionLedger::new(1_000_000.0));

        b.iter(|| {
            let _ = black_box(ledger.execute(black_box(&opportunity), 100.0));
        });
    });
}

criterion_group!(
    benches,
    bench_scan_three_venues,
    bench_scan_twenty_venues,
    bench_book_upsert_snapshot,
    bench_ledger_execute
);
criterion_main!(benches);
