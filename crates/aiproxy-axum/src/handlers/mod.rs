//! HTTP request handlers for the Axum web server.

pub mod live_ws;
pub mod system;
