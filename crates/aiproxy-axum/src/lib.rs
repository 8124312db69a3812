//! Axum web server adapter for aiproxy.
//!
//! Exposes the live session service over a websocket at `/api/gemini/ws`,
//! plus `/` (service info) and `/health`. [`bootstrap`] is the composition
//! root: it validates settings and builds the Gemini upstream client;
//! [`start_server`] binds and serves until the shutdown token is cancelled.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings for integration tests
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tokio_tungstenite as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod transport;

// Re-export primary types
pub use bootstrap::{
    AxumContext, CorsConfig, ServerConfig, bootstrap, bootstrap_with_upstream, serve, start_server,
};
pub use routes::create_router;
pub use state::AppState;
pub use transport::{WebSocketSink, WebSocketSource, connection_metadata, websocket_endpoint};
