//! Cross-venue arbitrage simulator entry point
//!
//! Orchestrates:
//! 1. Config + logging initialization
//! 2. Quote book, scanner and ledger
//! 3. Quote queue + shutdown broadcast
//! 4. FeedManager → one task per enabled venue
//! 5. Monitoring API server
//! 6. SchedulerLoop
//! 7. Operator console on stdin
//! 8. Ctrl+C graceful shutdown

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use hft_arb::adapters::{create_feeds, FeedManager, ReconnectConfig};
use hft_arb::config::constants::{apply_env_overrides, config_path};
use hft_arb::config::logging::init_logging;
use hft_arb::config::{load_config, AppConfig};
use hft_arb::console;
use hft_arb::core::{
    ChannelBundle, ExecutionLedger, FeeSchedule, OpportunityScanner, QuoteBook, SchedulerLoop,
    SchedulerSettings,
};
use hft_arb::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // =========================================================================
    // 1. Config + logging
    // =========================================================================
    dotenvy::dotenv().ok();
    init_logging();

    info!("=== Cross-venue arbitrage simulator ===");

    let path = config_path();
    let mut config = match load_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Config loaded");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not load config, using defaults");
            AppConfig::default()
        }
    };
    apply_env_overrides(&mut config);
    config
        .validate()
        .context("configuration is invalid after applying environment overrides")?;

    let venues: Vec<&str> = config.enabled_venues().map(|v| v.id.as_str()).collect();
    info!(
        instrument = %config.instrument,
        venues = ?venues,
        initial_balance = config.ledger.initial_balance,
        trade_size = config.ledger.trade_size,
        scan_interval_ms = config.scheduler.scan_interval_ms,
        "Starting with configuration"
    );

    // =========================================================================
    // 2. Quote book, scanner, ledger
    // =========================================================================
    let book = Arc::new(QuoteBook::new());
    let scanner = OpportunityScanner::new(FeeSchedule::from_venues(&config.venues))
        .with_max_quote_age_ms(config.scheduler.max_quote_age_ms);
    let ledger = Arc::new(ExecutionLedger::new(config.ledger.initial_balance));

    // =========================================================================
    // 3. Channels
    // =========================================================================
    let ChannelBundle {
        quote_tx,
        quote_rx,
        shutdown_tx,
    } = ChannelBundle::new(config.scheduler.queue_capacity);

    // =========================================================================
    // 4. FeedManager → launch all venue feeds
    // =========================================================================
    let manager = FeedManager::new(shutdown_tx.clone(), ReconnectConfig::from_env());
    manager.spawn_all(create_feeds(&config.venues), &quote_tx);

    // =========================================================================
    // 5. Monitoring API server
    // =========================================================================
    let server_handle = if config.api.enabled {
        let state = AppState::new(ledger.clone(), book.clone());
        let port = config.api.port;
        let shutdown_rx = shutdown_tx.subscribe();
        info!("[API] Serving on http://0.0.0.0:{}", port);
        Some(tokio::spawn(async move {
            if let Err(e) = server::start_server(state, port, shutdown_rx).await {
                error!(error = %e, "[API] Server failed");
            }
        }))
    } else {
        info!("[API] Disabled");
        None
    };

    // =========================================================================
    // 6. SchedulerLoop
    // =========================================================================
    let scheduler = SchedulerLoop::new(
        book.clone(),
        scanner,
        ledger.clone(),
        SchedulerSettings::from_config(&config),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(quote_rx));

    // =========================================================================
    // 7. Operator console
    // =========================================================================
    let console_handle = match console::stdin_lines(16) {
        Ok(lines) => {
            let ledger = ledger.clone();
            let shutdown_rx = shutdown_tx.subscribe();
            Some(tokio::spawn(async move {
                if let Err(e) =
                    console::run_console(lines, tokio::io::stdout(), ledger, shutdown_rx).await
                {
                    warn!(error = %e, "[CONSOLE] Stopped on write error");
                }
            }))
        }
        Err(e) => {
            warn!(error = %e, "[CONSOLE] Could not start stdin reader, console disabled");
            None
        }
    };

    // =========================================================================
    // 8. Wait for Ctrl+C → graceful shutdown
    // =========================================================================
    info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("[SHUTDOWN] Graceful shutdown initiated");

    let _ = shutdown_tx.send(());
    manager.wait().await;

    let dropped = quote_tx.dropped_count();
    let accepted = quote_tx.accepted_count();
    // Last sender: the scheduler drains what is buffered, then exits
    drop(quote_tx);

    let stats = scheduler_handle
        .await
        .context("scheduler task panicked")?;

    if let Some(handle) = server_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "[API] Server task ended abnormally");
        }
    }
    if let Some(handle) = console_handle {
        let _ = handle.await;
    }

    info!(
        quotes_accepted = accepted,
        quotes_dropped = dropped,
        quotes_ingested = stats.quotes_ingested,
        quotes_rejected = stats.quotes_rejected,
        scans = stats.scans,
        opportunities = stats.opportunities,
        executions = stats.executions,
        rejected_executions = stats.rejected_executions,
        "[SHUTDOWN] Scheduler stopped"
    );
    info!("[SHUTDOWN] Final: {}", ledger.summary());
    info!("=== Shutdown complete ===");
    Ok(())
}
