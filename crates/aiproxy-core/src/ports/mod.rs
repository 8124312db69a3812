//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No axum or websocket library types in any signature
//! - No provider wire formats; adapters decode at the boundary
//! - Intent-based methods (send, receive a turn, close), not socket plumbing

pub mod transport;
pub mod upstream;

pub use transport::{
    ConnectionMetadata, InboundFrame, TransportEndpoint, TransportError, TransportSink,
    TransportSource,
};
pub use upstream::{
    Credentials, OpenRequest, TurnStream, UpstreamClient, UpstreamError, UpstreamSession,
};
