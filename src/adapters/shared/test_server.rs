//! Local WebSocket peers for feed tests

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Plain-ws venue stand-in for one connection.
///
/// With `await_subscribe`, waits for the client's first text frame and hands
/// it back through the receiver before pushing `frames`. Afterwards it idles
/// so the socket stays open.
pub async fn venue_server(
    frames: Vec<String>,
    await_subscribe: bool,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (first_tx, first_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if await_subscribe {
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    let _ = first_tx.send(text);
                    break;
                }
            }
        }
        for frame in frames {
            if ws.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }
        // Drain client frames (pings, close) until the client leaves
        let _ = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;
    });

    (format!("ws://{}", addr), first_rx)
}

/// Accepts TCP connections and never answers the upgrade request.
pub async fn stalled_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("ws://{}", addr)
}
