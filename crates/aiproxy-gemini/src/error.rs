//! Gemini adapter errors.

use std::time::Duration;

use aiproxy_core::UpstreamError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid JSON from server: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 media from server: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),

    #[error("server closed the connection during {0}")]
    ClosedDuring(&'static str),
}

impl GeminiError {
    /// Map a failure while opening the session.
    pub fn into_connect(self) -> UpstreamError {
        UpstreamError::Connect(self.to_string())
    }

    /// Map a failure while reading a turn.
    pub fn into_receive(self) -> UpstreamError {
        match self {
            Self::Json(_) | Self::Base64(_) => UpstreamError::Protocol(self.to_string()),
            Self::WebSocket(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                UpstreamError::Closed
            }
            other => UpstreamError::Receive(other.to_string()),
        }
    }
}
