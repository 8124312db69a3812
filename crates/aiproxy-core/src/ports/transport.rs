//! Transport endpoint port: the client-facing socket.
//!
//! # Design Rules
//!
//! - No websocket library types in any signature; adapters convert frames
//!   into [`InboundFrame`] and serialise [`ServerMessage`] themselves.
//! - The endpoint is split at accept time: the sink is shared (router and
//!   receive pump both write to it), the source has exactly one reader.
//! - Connection metadata is an immutable snapshot taken at accept time.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::ServerMessage;

/// Snapshot of the connection handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionMetadata {
    /// Header values keyed by lower-cased header name.
    ///
    /// Repeated headers are joined with `", "`.
    pub headers: BTreeMap<String, String>,
    /// Address of the directly connected peer, when known.
    pub peer_addr: Option<SocketAddr>,
    /// Query string parameters of the connect request.
    pub query: BTreeMap<String, String>,
}

impl ConnectionMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, joining with any existing value of the same name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Set the direct peer address.
    #[must_use]
    pub const fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Add a header in place, joining with any existing value of the same name.
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Look up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// One frame read from the client.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A JSON message.
    Json(Value),
    /// Raw binary data, treated as PCM16 audio.
    Binary(Vec<u8>),
}

/// Errors raised by transport adapters.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The client went away.
    #[error("Client disconnected")]
    Disconnected,

    /// A single frame could not be decoded. The connection is still usable.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The connection failed.
    #[error("Transport failure: {0}")]
    Connection(String),
}

impl TransportError {
    /// Whether the connection can keep being used after this error.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedFrame(_))
    }
}

/// Write half of a transport endpoint.
#[async_trait]
pub trait TransportSink: Send + Sync {
    /// Send one message to the client.
    async fn send(&self, message: &ServerMessage) -> Result<(), TransportError>;
}

/// Read half of a transport endpoint.
#[async_trait]
pub trait TransportSource: Send {
    /// Wait for the next client frame.
    ///
    /// Returns `Ok(None)` once the client has disconnected.
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError>;
}

/// An accepted client connection.
pub struct TransportEndpoint {
    /// Handshake snapshot.
    pub metadata: ConnectionMetadata,
    /// Shared write half.
    pub sink: Arc<dyn TransportSink>,
    /// Exclusive read half.
    pub source: Box<dyn TransportSource>,
}

impl TransportEndpoint {
    /// Assemble an endpoint from its parts.
    pub fn new(
        metadata: ConnectionMetadata,
        sink: Arc<dyn TransportSink>,
        source: Box<dyn TransportSource>,
    ) -> Self {
        Self {
            metadata,
            sink,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let meta = ConnectionMetadata::new().with_header("X-Real-IP", "10.0.0.1");
        assert_eq!(meta.header("x-real-ip"), Some("10.0.0.1"));
        assert_eq!(meta.header("X-REAL-IP"), Some("10.0.0.1"));
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let meta = ConnectionMetadata::new()
            .with_header("x-forwarded-for", "203.0.113.5")
            .with_header("X-Forwarded-For", "70.41.3.18");
        assert_eq!(meta.header("x-forwarded-for"), Some("203.0.113.5, 70.41.3.18"));
    }

    #[test]
    fn test_only_malformed_frames_are_recoverable() {
        assert!(TransportError::MalformedFrame("bad json".into()).is_recoverable());
        assert!(!TransportError::Disconnected.is_recoverable());
        assert!(!TransportError::Connection("reset".into()).is_recoverable());
    }
}
