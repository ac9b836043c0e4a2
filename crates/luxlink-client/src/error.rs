//! Client error type.

use thiserror::Error;

/// Errors produced by bridge API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge answered with a non-success status.
    #[error("bridge returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the bridge.
        body: String,
    },

    /// WebSocket handshake or stream failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The configured API key cannot be encoded as an HTTP header.
    #[error("API key is not a valid header value")]
    InvalidApiKey,
}
