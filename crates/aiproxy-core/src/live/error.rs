//! Session error taxonomy.

use thiserror::Error;

use crate::domain::ServerMessage;
use crate::ports::UpstreamError;
use crate::settings::SettingsError;

/// Errors that end (or, for malformed payloads, interrupt) a live session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing or invalid provider configuration. Reported once, never retried.
    #[error(transparent)]
    Configuration(#[from] SettingsError),

    /// The upstream session could not be opened.
    #[error(transparent)]
    UpstreamConnect(UpstreamError),

    /// The client went away. Expected; never reported to the client.
    #[error("Client disconnected")]
    TransportDisconnect,

    /// Delivering input upstream failed.
    #[error(transparent)]
    UpstreamSend(UpstreamError),

    /// The upstream response stream failed.
    #[error(transparent)]
    UpstreamReceive(UpstreamError),

    /// One client message could not be used. The session continues.
    #[error("Malformed client payload: {0}")]
    MalformedClientPayload(String),

    /// A session activity panicked.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Whether this error ends the session.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedClientPayload(_))
    }

    /// The frame to report to the client, if any.
    ///
    /// A disconnect has nobody to report to.
    pub fn client_message(&self) -> Option<ServerMessage> {
        match self {
            Self::TransportDisconnect => None,
            other => Some(ServerMessage::error(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_is_silent() {
        assert!(SessionError::TransportDisconnect.client_message().is_none());
    }

    #[test]
    fn test_configuration_error_is_reported_verbatim() {
        let err = SessionError::from(SettingsError::MissingCredentials);
        assert_eq!(
            err.client_message(),
            Some(ServerMessage::error(
                "GEMINI_API_KEY not found in environment variables"
            ))
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_malformed_payload_is_not_fatal() {
        assert!(!SessionError::MalformedClientPayload("bad".into()).is_fatal());
        assert!(SessionError::UpstreamReceive(UpstreamError::Closed).is_fatal());
    }
}
