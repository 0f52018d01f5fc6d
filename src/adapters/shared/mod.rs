//! Shared helpers for venue feeds
//!
//! WebSocket connection and read loop, plus reconnection backoff.

pub mod reconnect;
pub mod websocket;

#[cfg(test)]
pub(crate) mod test_server;

pub use reconnect::ReconnectConfig;
pub use websocket::{
    connect_tls, connect_tls_within, pump_quotes, send_json, Heartbeat, TlsWebSocketStream,
    CONNECT_TIMEOUT_MS,
};
