//! Read-only HTTP monitoring API.
//!
//! Uses `axum` with permissive CORS. Every data endpoint wraps its payload
//! in the same envelope: `{ "status": "success", "data": ..., "timestamp": <unix secs> }`.
//!
//! # Routes
//! - `GET /pnl`: full ledger status
//! - `GET /summary`: condensed status line plus headline numbers
//! - `GET /trades?limit=N`: most recent trade legs (default 10)
//! - `GET /quotes`: current quote book
//! - `GET /health`: liveness and uptime

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::core::ledger::{format_summary, ExecutionLedger};
use crate::core::quote_book::QuoteBook;
use crate::core::types::{PnLStatus, Quote, Trade};
use crate::error::AppError;

/// Trades returned when `limit` is missing or unusable
pub const DEFAULT_TRADE_LIMIT: i64 = 10;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<ExecutionLedger>,
    pub book: Arc<QuoteBook>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(ledger: Arc<ExecutionLedger>, book: Arc<QuoteBook>) -> Self {
        Self {
            ledger,
            book,
            started_at: Instant::now(),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Common response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub timestamp: i64,
}

impl<T> ApiEnvelope<T> {
    fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
            count: None,
            timestamp: Utc::now().timestamp(),
        }
    }

    fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryData {
    pub summary: String,
    pub current_balance: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: f64,
    pub total_trades: u64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    /// Kept as a string so a malformed value falls back to the default
    /// instead of rejecting the request.
    pub limit: Option<String>,
}

/// Missing, unparsable or non-positive → [`DEFAULT_TRADE_LIMIT`]
pub fn resolve_trade_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_TRADE_LIMIT)
}

// =============================================================================
// Router
// =============================================================================

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/pnl", get(pnl_handler))
        .route("/summary", get(summary_handler))
        .route("/trades", get(trades_handler))
        .route("/quotes", get(quotes_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server and serve until `shutdown_rx` fires.
pub async fn start_server(
    state: AppState,
    port: u16,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), AppError> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Api(format!("failed to bind {}: {}", addr, e)))?;
    info!(address = %addr, "[API] Monitoring server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("[API] Shutting down");
        })
        .await?;

    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /pnl
async fn pnl_handler(State(state): State<AppState>) -> Json<ApiEnvelope<PnLStatus>> {
    Json(ApiEnvelope::success(state.ledger.current_status()))
}

/// GET /summary
async fn summary_handler(State(state): State<AppState>) -> Json<ApiEnvelope<SummaryData>> {
    let status = state.ledger.current_status();
    Json(ApiEnvelope::success(SummaryData {
        summary: format_summary(&status),
        current_balance: status.current_balance,
        total_pnl: status.total_pnl,
        total_pnl_percent: status.total_pnl_percent,
        total_trades: status.total_trades,
        win_rate: status.win_rate,
    }))
}

/// GET /trades?limit=N
async fn trades_handler(
    State(state): State<AppState>,
    Query(query): Query<TradesQuery>,
) -> Json<ApiEnvelope<Vec<Trade>>> {
    let limit = resolve_trade_limit(query.limit.as_deref());
    let trades = state.ledger.trade_history(limit);
    let count = trades.len();
    Json(ApiEnvelope::success(trades).with_count(count))
}

/// GET /quotes
async fn quotes_handler(State(state): State<AppState>) -> Json<ApiEnvelope<Vec<Quote>>> {
    let quotes = state.book.snapshot();
    let count = quotes.len();
    Json(ApiEnvelope::success(quotes).with_count(count))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().timestamp(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
