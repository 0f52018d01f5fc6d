//! Venue feed error types
//!
//! Feed failures stay in the adapter layer: the feed manager logs them and
//! reconnects. The core never sees an `ExchangeError`.

use thiserror::Error;

/// Venue-specific error types for feed operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Connection to venue failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Venue rejected or never acknowledged the market data subscription
    #[error("Subscription failed for {symbol}: {reason}")]
    SubscriptionFailed { symbol: String, reason: String },

    /// Network operation timed out
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Invalid or unexpected message from venue
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Stream ended without a shutdown request
    #[error("Connection closed by {0}")]
    ConnectionClosed(String),

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for ExchangeError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ExchangeError::WebSocket(Box::new(e))
    }
}

/// Result type alias for feed operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let err = ExchangeError::ConnectionFailed("TLS error".to_string());
        assert_eq!(err.to_string(), "Connection failed: TLS error");
    }

    #[test]
    fn test_subscription_failed_display() {
        let err = ExchangeError::SubscriptionFailed {
            symbol: "DOGE/ABC".to_string(),
            reason: "Currency pair not supported".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Subscription failed for DOGE/ABC: Currency pair not supported"
        );
    }

    #[test]
    fn test_network_timeout_display() {
        let err = ExchangeError::NetworkTimeout(5000);
        assert_eq!(err.to_string(), "Network timeout after 5000ms");
    }

    #[test]
    fn test_invalid_response_display() {
        let err = ExchangeError::InvalidResponse("malformed JSON".to_string());
        assert_eq!(err.to_string(), "Invalid response: malformed JSON");
    }

    #[test]
    fn test_connection_closed_display() {
        let err = ExchangeError::ConnectionClosed("okx".to_string());
        assert_eq!(err.to_string(), "Connection closed by okx");
    }

    #[test]
    fn test_tungstenite_error_converts() {
        let err: ExchangeError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, ExchangeError::WebSocket(_)));
        assert!(err.to_string().starts_with("WebSocket error"));
    }
}
