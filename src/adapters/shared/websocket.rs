//! Shared WebSocket connection helpers
//!
//! TLS connect plus the read loop every feed uses: parse each text frame,
//! forward quotes to the scheduler queue, stop on shutdown.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::core::channels::{EnqueueOutcome, QuoteSender};
use crate::core::types::Quote;

/// Type alias for the WebSocket stream with TLS
pub type TlsWebSocketStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Upper bound on TCP connect + TLS + WebSocket upgrade
pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Connect to a WebSocket endpoint with TLS (TLSv1.2 minimum)
pub async fn connect_tls(url: &str) -> ExchangeResult<TlsWebSocketStream> {
    connect_tls_within(url, Duration::from_millis(CONNECT_TIMEOUT_MS)).await
}

/// [`connect_tls`] with an explicit handshake deadline.
///
/// A peer that accepts TCP but never completes the upgrade yields
/// `NetworkTimeout` instead of hanging the feed.
pub async fn connect_tls_within(url: &str, limit: Duration) -> ExchangeResult<TlsWebSocketStream> {
    let tls = native_tls::TlsConnector::builder()
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
        .build()
        .map_err(|e| ExchangeError::ConnectionFailed(format!("TLS error: {}", e)))?;

    let (ws_stream, _response) = timeout(
        limit,
        connect_async_tls_with_config(url, None, false, Some(Connector::NativeTls(tls))),
    )
    .await
    .map_err(|_| ExchangeError::NetworkTimeout(limit.as_millis() as u64))?
    .map_err(|e| ExchangeError::WebSocket(Box::new(e)))?;

    Ok(ws_stream)
}

/// Send one JSON text frame
pub async fn send_json(ws: &mut TlsWebSocketStream, payload: &serde_json::Value) -> ExchangeResult<()> {
    ws.send(Message::Text(payload.to_string())).await?;
    Ok(())
}

/// Application-level keepalive for venues that expect a text ping
#[derive(Debug, Clone)]
pub struct Heartbeat {
    pub interval: Duration,
    pub payload: String,
}

/// Read frames until shutdown, queue closure or connection loss.
///
/// `parse` maps one text frame to `Some(quote)`, `None` for control frames
/// (acks, heartbeats), or an error. `InvalidResponse` errors are logged and
/// skipped; any other error ends the stream.
pub async fn pump_quotes<P>(
    ws: &mut TlsWebSocketStream,
    venue: &str,
    tx: &QuoteSender,
    shutdown: &mut broadcast::Receiver<()>,
    heartbeat: Option<Heartbeat>,
    mut parse: P,
) -> ExchangeResult<()>
where
    P: FnMut(&str) -> ExchangeResult<Option<Quote>> + Send,
{
    let ping_every = heartbeat
        .as_ref()
        .map(|h| h.interval)
        .unwrap_or(Duration::from_secs(3600));
    let mut ping_tick = tokio::time::interval_at(tokio::time::Instant::now() + ping_every, ping_every);
    let mut quotes: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!(venue = %venue, quotes, "[FEED] Shutdown received, closing socket");
                let _ = ws.close(None).await;
                return Ok(());
            }
            _ = ping_tick.tick(), if heartbeat.is_some() => {
                if let Some(hb) = &heartbeat {
                    ws.send(Message::Text(hb.payload.clone())).await?;
                }
            }
            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match parse(&text) {
                        Ok(Some(quote)) => {
                            quotes += 1;
                            match tx.try_enqueue(quote) {
                                EnqueueOutcome::Accepted => {}
                                EnqueueOutcome::Dropped => {
                                    debug!(venue = %venue, dropped = tx.dropped_count(), "[FEED] Queue full, quote dropped");
                                }
                                EnqueueOutcome::Closed => {
                                    info!(venue = %venue, "[FEED] Quote queue closed, stopping feed");
                                    let _ = ws.close(None).await;
                                    return Ok(());
                                }
                            }
                        }
                        Ok(None) => {}
                        Err(ExchangeError::InvalidResponse(reason)) => {
                            warn!(venue = %venue, reason = %reason, "[FEED] Skipping unparsable message");
                        }
                        Err(e) => return Err(e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!(venue = %venue, frame = ?frame, "[FEED] Venue closed the connection");
                        return Err(ExchangeError::ConnectionClosed(venue.to_string()));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ExchangeError::WebSocket(Box::new(e))),
                    None => return Err(ExchangeError::ConnectionClosed(venue.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::shared::test_server::stalled_listener;
    use crate::core::channels::quote_channel;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{accept_async, connect_async};

    fn parse_csv(text: &str) -> ExchangeResult<Option<Quote>> {
        if text == "ack" {
            return Ok(None);
        }
        if text == "fatal" {
            return Err(ExchangeError::SubscriptionFailed {
                symbol: "X".into(),
                reason: "rejected".into(),
            });
        }
        let parts: Vec<&str> = text.split(',').collect();
        if parts.len() != 2 {
            return Err(ExchangeError::InvalidResponse(text.to_string()));
        }
        let bid = parts[0].parse().map_err(|_| ExchangeError::InvalidResponse(text.into()))?;
        let ask = parts[1].parse().map_err(|_| ExchangeError::InvalidResponse(text.into()))?;
        Ok(Some(Quote::new("test", "X", bid, ask, 1)))
    }

    /// Local plain-ws server that sends `frames` then either closes or idles.
    async fn serve(frames: Vec<&'static str>, close: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            for frame in frames {
                ws.send(Message::Text(frame.to_string())).await.unwrap();
            }
            if close {
                let _ = ws.close(None).await;
            } else {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_pump_forwards_quotes_and_reports_close() {
        let url = serve(vec!["ack", "1.0,1.1", "garbage", "2.0,2.1"], true).await;
        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let (tx, mut rx) = quote_channel(8);
        let (_shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let result = timeout(
            Duration::from_secs(2),
            pump_quotes(&mut ws, "test", &tx, &mut shutdown_rx, None, parse_csv),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(ExchangeError::ConnectionClosed(_))));
        assert_eq!(rx.recv().await.unwrap().bid, 1.0);
        assert_eq!(rx.recv().await.unwrap().bid, 2.0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pump_stops_on_fatal_parse_error() {
        let url = serve(vec!["fatal", "1.0,1.1"], false).await;
        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let (tx, _rx) = quote_channel(8);
        let (_shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let result = timeout(
            Duration::from_secs(2),
            pump_quotes(&mut ws, "test", &tx, &mut shutdown_rx, None, parse_csv),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(ExchangeError::SubscriptionFailed { .. })));
    }

    #[tokio::test]
    async fn test_pump_returns_ok_on_shutdown() {
        let url = serve(vec![], false).await;
        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let (tx, _rx) = quote_channel(8);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move {
            pump_quotes(&mut ws, "test", &tx, &mut shutdown_rx, None, parse_csv).await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        let result = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_pump_returns_ok_when_queue_closed() {
        let url = serve(vec!["1.0,1.1"], false).await;
        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let (tx, rx) = quote_channel(8);
        drop(rx);
        let (_shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let result = timeout(
            Duration::from_secs(2),
            pump_quotes(&mut ws, "test", &tx, &mut shutdown_rx, None, parse_csv),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_connect_times_out_on_stalled_upgrade() {
        let url = stalled_listener().await;
        let started = std::time::Instant::now();
        let result = connect_tls_within(&url, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(ExchangeError::NetworkTimeout(100))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connect_plain_ws_within_deadline() {
        let url = serve(vec!["1.0,1.1"], false).await;
        let mut ws = connect_tls_within(&url, Duration::from_secs(2)).await.unwrap();
        let frame = timeout(Duration::from_secs(2), ws.next()).await.unwrap();
        assert!(matches!(frame, Some(Ok(Message::Text(t))) if t == "1.0,1.1"));
    }
}
