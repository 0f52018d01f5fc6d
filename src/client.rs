//! HTTP client for the monitoring API, plus plain-text renderers used by
//! the `pnl_client` binary.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::types::{PnLStatus, Trade};
use crate::server::{ApiEnvelope, HealthResponse, SummaryData};

pub const DEFAULT_HOST: &str = "localhost:8080";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct StatusClient {
    base_url: String,
    http: reqwest::Client,
}

impl StatusClient {
    /// `host` may be `host:port` or a full `http(s)://` URL.
    pub fn new(host: &str) -> Result<Self, ClientError> {
        let trimmed = host.trim_end_matches('/');
        let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn pnl(&self) -> Result<PnLStatus, ClientError> {
        let env: ApiEnvelope<PnLStatus> = self.get_json("/pnl").await?;
        Ok(env.data)
    }

    pub async fn summary(&self) -> Result<SummaryData, ClientError> {
        let env: ApiEnvelope<SummaryData> = self.get_json("/summary").await?;
        Ok(env.data)
    }

    pub async fn trades(&self, limit: i64) -> Result<Vec<Trade>, ClientError> {
        let env: ApiEnvelope<Vec<Trade>> =
            self.get_json(&format!("/trades?limit={}", limit)).await?;
        Ok(env.data)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json("/health").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "[API] GET");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

// =============================================================================
// Renderers
// =============================================================================

pub fn render_pnl(status: &PnLStatus) -> String {
    let mut out = String::new();
    out.push_str("=== P&L Status ===\n");
    out.push_str(&format!("Initial Balance:  ${:.2}\n", status.initial_balance));
    out.push_str(&format!("Current Balance:  ${:.2}\n", status.current_balance));
    out.push_str(&format!(
        "Total P&L:        ${:.2} ({:.2}%)\n",
        status.total_pnl, status.total_pnl_percent
    ));
    out.push_str(&format!("Total Trades:     {}\n", status.total_trades));
    out.push_str(&format!(
        "Winning/Losing:   {}/{}\n",
        status.winning_trades, status.losing_trades
    ));
    out.push_str(&format!("Win Rate:         {:.1}%\n", status.win_rate));
    out.push_str(&format!("Largest Win:      ${:.4}\n", status.largest_win));
    out.push_str(&format!("Largest Loss:     ${:.4}\n", status.largest_loss));
    out.push_str(&format!("Average P&L:      ${:.4}\n", status.average_pnl));
    out.push_str(&format!(
        "Last Update:      {}\n",
        status.last_update.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

pub fn render_summary(summary: &SummaryData) -> String {
    format!(
        "{}\nBalance: ${:.2}\n",
        summary.summary, summary.current_balance
    )
}

pub fn render_trades(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "No trades yet\n".to_string();
    }
    let mut out = format!("=== Last {} Trades ===\n", trades.len());
    for t in trades {
        out.push_str(&format!(
            "{} {:<4} {:<8} {} {:.6} @ {:.6}\n",
            t.timestamp.format("%H:%M:%S%.3f"),
            t.side,
            t.venue,
            t.symbol,
            t.quantity,
            t.price
        ));
    }
    out
}

pub fn render_health(health: &HealthResponse) -> String {
    format!(
        "Status: {} (uptime {}s)\n",
        health.status, health.uptime_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{TradeSide, TradeStatus};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn sample_status() -> PnLStatus {
        PnLStatus {
            current_balance: 1002.0,
            initial_balance: 1000.0,
            total_pnl: 2.0,
            total_pnl_percent: 0.2,
            total_trades: 4,
            winning_trades: 2,
            losing_trades: 2,
            win_rate: 50.0,
            largest_win: 1.0,
            largest_loss: -1.0,
            average_pnl: 0.5,
            last_update: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_new_normalizes_host() {
        let c = StatusClient::new("localhost:8080").unwrap();
        assert_eq!(c.base_url(), "http://localhost:8080");

        let c = StatusClient::new("https://example.com/").unwrap();
        assert_eq!(c.base_url(), "https://example.com");
    }

    #[test]
    fn test_render_pnl() {
        let out = render_pnl(&sample_status());
        assert!(out.contains("Current Balance:  $1002.00"));
        assert!(out.contains("Total P&L:        $2.00 (0.20%)"));
        assert!(out.contains("Winning/Losing:   2/2"));
        assert!(out.contains("2024-01-02 03:04:05 UTC"));
    }

    #[test]
    fn test_render_trades() {
        assert_eq!(render_trades(&[]), "No trades yet\n");

        let trade = Trade {
            id: uuid::Uuid::now_v7(),
            side: TradeSide::Buy,
            venue: Arc::from("binance"),
            symbol: Arc::from("DOGE/USDT"),
            price: 0.0785,
            quantity: 1273.885350,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            status: TradeStatus::Filled,
        };
        let out = render_trades(&[trade]);
        assert!(out.starts_with("=== Last 1 Trades ===\n"));
        assert!(out.contains("BUY"));
        assert!(out.contains("binance"));
        assert!(out.contains("@ 0.078500"));
    }

    #[test]
    fn test_render_health() {
        let h = HealthResponse {
            status: "healthy".into(),
            timestamp: 0,
            uptime_secs: 42,
        };
        assert_eq!(render_health(&h), "Status: healthy (uptime 42s)\n");
    }

    #[tokio::test]
    async fn test_pnl_fetch() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "status": "success",
            "data": sample_status(),
            "timestamp": 1_700_000_000
        });
        let mock = server
            .mock("GET", "/pnl")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = StatusClient::new(&server.url()).unwrap();
        let status = client.pnl().await.unwrap();
        assert_eq!(status, sample_status());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_trades_fetch_passes_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/trades")
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "3".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","data":[],"count":0,"timestamp":1}"#)
            .create_async()
            .await;

        let client = StatusClient::new(&server.url()).unwrap();
        let trades = client.trades(3).await.unwrap();
        assert!(trades.is_empty());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_health_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"healthy","timestamp":1700000000,"uptime_secs":12}"#)
            .create_async()
            .await;

        let client = StatusClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.uptime_secs, 12);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/summary")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = StatusClient::new(&server.url()).unwrap();
        match client.summary().await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected Status error, got {:?}", other.map(|s| s.summary)),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pnl")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = StatusClient::new(&server.url()).unwrap();
        assert!(matches!(client.pnl().await, Err(ClientError::Network(_))));
    }
}
