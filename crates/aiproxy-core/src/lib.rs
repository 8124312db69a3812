//! Core domain types, ports and the live session relay for aiproxy.
//!
//! This crate has no knowledge of HTTP frameworks or provider wire formats.
//! Adapters implement [`ports::TransportSink`]/[`ports::TransportSource`]
//! for the client side and [`ports::UpstreamClient`] for the provider side;
//! [`live::LiveSessionService`] bridges the two.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod live;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AudioChunk, AudioRejection, CONTEXT_FIELDS, CapabilityConfig, ClientContext, ClientMessage,
    FunctionCall, InboundEvent, OutboundMessage, ResponseModality, ServerMessage, SessionOptions,
    ToolSpec, decode_client_audio,
};
pub use live::{
    ExitCause, LiveSessionService, SessionError, SessionState, SessionSummary,
    extract_client_context,
};
pub use ports::{
    ConnectionMetadata, Credentials, InboundFrame, OpenRequest, TransportEndpoint, TransportError,
    TransportSink, TransportSource, TurnStream, UpstreamClient, UpstreamError, UpstreamSession,
};
pub use settings::{
    DEFAULT_LIVE_MODEL, DEFAULT_SERVER_PORT, DEFAULT_VOICE, LiveSettings, SettingsError,
    validate_settings,
};

// Dev-dependencies used only by integration tests
#[cfg(test)]
use mockall as _;
