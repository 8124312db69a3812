//! Upstream streaming client port: the AI provider connection.
//!
//! # Design Rules
//!
//! - Adapters decode provider frames into [`InboundEvent`] once, at the
//!   boundary. Core code never sees provider SDK or wire shapes.
//! - A session handle is shared: the router and the send pump call
//!   [`UpstreamSession::send`] while the receive pump is parked in
//!   [`UpstreamSession::receive_turn`]. Implementations must allow that.
//! - End of stream is a value (`Ok(None)`), not an error. Errors are reserved
//!   for conditions that make the session unusable.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::{CapabilityConfig, InboundEvent, OutboundMessage};

/// Events of one upstream turn, in emission order.
///
/// The stream ends when the provider signals turn completion.
pub type TurnStream = BoxStream<'static, Result<InboundEvent, UpstreamError>>;

/// Provider credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Wrap an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// The raw API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Parameters for opening an upstream session.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    /// Provider model identifier.
    pub model: String,
    /// Resolved credentials.
    pub credentials: Credentials,
    /// Capability configuration.
    pub capabilities: CapabilityConfig,
}

/// Errors from the upstream provider connection.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The session could not be established.
    #[error("Failed to connect upstream: {0}")]
    Connect(String),

    /// An input could not be delivered.
    #[error("Upstream send failed: {0}")]
    Send(String),

    /// The response stream broke.
    #[error("Upstream receive failed: {0}")]
    Receive(String),

    /// The provider sent something that could not be decoded.
    #[error("Upstream protocol error: {0}")]
    Protocol(String),

    /// The session is already closed.
    #[error("Upstream session closed")]
    Closed,
}

/// Factory for upstream sessions.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Human-readable provider name, e.g. `"Gemini Live"`.
    fn provider_name(&self) -> &str;

    /// Open a new session.
    async fn open(&self, request: &OpenRequest) -> Result<Arc<dyn UpstreamSession>, UpstreamError>;
}

/// An open upstream session.
#[async_trait]
pub trait UpstreamSession: Send + Sync {
    /// Deliver one input. `end_of_turn` tells the model the user is done.
    async fn send(&self, input: &OutboundMessage, end_of_turn: bool) -> Result<(), UpstreamError>;

    /// Wait for the next turn's event stream.
    ///
    /// Returns `Ok(None)` once the provider has ended the session.
    async fn receive_turn(&self) -> Result<Option<TurnStream>, UpstreamError>;

    /// Close the session. Calling this on a closed session is harmless.
    async fn close(&self) -> Result<(), UpstreamError>;
}
