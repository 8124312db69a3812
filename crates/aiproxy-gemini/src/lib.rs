//! Gemini Live upstream adapter for aiproxy.
//!
//! Implements [`aiproxy_core::UpstreamClient`] over the Gemini Live
//! `BidiGenerateContent` websocket protocol. Provider frames are decoded into
//! [`aiproxy_core::InboundEvent`]s here and nowhere else.

#![deny(unused_crate_dependencies)]

mod client;
mod error;
pub mod protocol;
mod session;

pub use client::{DEFAULT_ENDPOINT, DEFAULT_SETUP_TIMEOUT, GeminiConfig, GeminiLiveClient};
pub use error::GeminiError;
pub use session::GeminiLiveSession;

