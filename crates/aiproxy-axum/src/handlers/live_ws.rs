//! WebSocket upgrade handler for Gemini Live sessions.
//!
//! `GET /api/gemini/ws` upgrades the connection and hands the socket to the
//! live session service, which bridges it to one upstream session until
//! either side goes away or the server shuts down.
//!
//! ## Query parameters
//!
//! | Name | Meaning |
//! |---|---|
//! | `enable_code_execution` | `true`/`false`, defaults to the server setting |
//! | `enable_google_search` | `true`/`false`, defaults to the server setting |
//! | `model` | upstream model override for this session |

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use aiproxy_core::{LiveSettings, SessionOptions};
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, FromRequestParts, Query, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use tracing::{debug, info};

use crate::state::AppState;
use crate::transport::{connection_metadata, websocket_endpoint};

/// Peer socket address, when the server was started with connect info.
#[derive(Debug, Clone, Copy)]
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// `GET /api/gemini/ws`
pub async fn gemini_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    PeerAddr(peer_addr): PeerAddr,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let options = session_options_from_query(&query, state.live.settings());
    let metadata = connection_metadata(&headers, peer_addr, query);
    debug!(peer = ?peer_addr, ?options, "Upgrading live websocket");

    ws.on_upgrade(move |socket| handle_live_ws(socket, state, metadata, options))
}

async fn handle_live_ws(
    socket: WebSocket,
    state: AppState,
    metadata: aiproxy_core::ConnectionMetadata,
    options: SessionOptions,
) {
    let endpoint = websocket_endpoint(socket, metadata);
    let summary = state
        .live
        .run(endpoint, options, state.shutdown.child_token())
        .await;

    info!(
        session_id = %summary.session_id,
        final_state = %summary.final_state,
        "Live websocket closed"
    );
}

/// Per-session capability flags from the upgrade query.
pub fn session_options_from_query(
    query: &BTreeMap<String, String>,
    settings: &LiveSettings,
) -> SessionOptions {
    let defaults = settings.default_session_options();
    SessionOptions {
        enable_code_execution: query
            .get("enable_code_execution")
            .and_then(|v| parse_flag(v))
            .unwrap_or(defaults.enable_code_execution),
        enable_google_search: query
            .get("enable_google_search")
            .and_then(|v| parse_flag(v))
            .unwrap_or(defaults.enable_google_search),
        model: query
            .get("model")
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(ToString::to_string),
        ..defaults
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
