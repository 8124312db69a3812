//! Websocket-backed transport endpoint.
//!
//! The upgraded socket is split once: the write half goes behind a mutex so
//! the router and the receive pump can both send, the read half is owned by
//! the router.
//!
//! | Client frame | Becomes                                   |
//! |--------------|-------------------------------------------|
//! | Text         | JSON message, or `MalformedFrame` if not JSON |
//! | Binary       | raw PCM16 audio                           |
//! | Close        | disconnect                                |
//! | Ping / Pong  | skipped (axum answers pings)              |

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use aiproxy_core::{
    ConnectionMetadata, InboundFrame, ServerMessage, TransportEndpoint, TransportError,
    TransportSink, TransportSource,
};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::http::HeaderMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tracing::debug;

/// Snapshot the upgrade request.
pub fn connection_metadata(
    headers: &HeaderMap,
    peer_addr: Option<SocketAddr>,
    query: BTreeMap<String, String>,
) -> ConnectionMetadata {
    let mut metadata = ConnectionMetadata {
        peer_addr,
        query,
        ..ConnectionMetadata::default()
    };
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            metadata.insert_header(name.as_str(), value);
        }
    }
    metadata
}

/// Split an upgraded socket into a transport endpoint.
pub fn websocket_endpoint(socket: WebSocket, metadata: ConnectionMetadata) -> TransportEndpoint {
    let (sink, stream) = socket.split();
    TransportEndpoint::new(
        metadata,
        Arc::new(WebSocketSink {
            sink: Mutex::new(sink),
        }),
        Box::new(WebSocketSource { stream }),
    )
}

/// Write half: sends each message as a JSON text frame.
pub struct WebSocketSink {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

#[async_trait]
impl TransportSink for WebSocketSink {
    async fn send(&self, message: &ServerMessage) -> Result<(), TransportError> {
        let text = serde_json::to_string(message)
            .map_err(|e| TransportError::Connection(format!("serialize {}: {e}", message.kind())))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| TransportError::Disconnected)
    }
}

/// Read half.
pub struct WebSocketSource {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl TransportSource for WebSocketSource {
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    return serde_json::from_str(text.as_str())
                        .map(|value| Some(InboundFrame::Json(value)))
                        .map_err(|e| TransportError::MalformedFrame(e.to_string()));
                }
                Ok(Message::Binary(bytes)) => return Ok(Some(InboundFrame::Binary(bytes.to_vec()))),
                Ok(Message::Close(frame)) => {
                    debug!(frame = ?frame, "Client sent close frame");
                    return Ok(None);
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => return Err(TransportError::Connection(e.to_string())),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_metadata_snapshot() {
        let mut headers = HeaderMap::new();
        headers.insert("x-client-id", HeaderValue::from_static("kiosk-1"));
        headers.append("x-forwarded-for", HeaderValue::from_static("203.0.113.5"));
        headers.append("x-forwarded-for", HeaderValue::from_static("70.41.3.18"));
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let query = BTreeMap::from([("model".to_string(), "models/x".to_string())]);

        let metadata = connection_metadata(&headers, Some(peer), query);

        assert_eq!(metadata.header("X-Client-Id"), Some("kiosk-1"));
        assert_eq!(
            metadata.header("x-forwarded-for"),
            Some("203.0.113.5, 70.41.3.18")
        );
        assert_eq!(metadata.peer_addr, Some(peer));
        assert_eq!(metadata.query.get("model").map(String::as_str), Some("models/x"));
    }

    #[test]
    fn test_non_utf8_headers_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-app-name", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        let metadata = connection_metadata(&headers, None, BTreeMap::new());

        assert!(metadata.header("x-app-name").is_none());
    }
}
