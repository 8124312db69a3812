//! An open Gemini Live session.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aiproxy_core::{InboundEvent, OutboundMessage, TurnStream, UpstreamError, UpstreamSession};
use async_trait::async_trait;
use futures_util::stream::{self, SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::GeminiError;
use crate::protocol::{self, LiveServerMessage};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsReader = SplitStream<WsStream>;

/// Read the next JSON frame from the server.
///
/// Returns `Ok(None)` once the server has closed the connection. Text and
/// binary frames are both parsed as JSON.
pub(crate) async fn next_server_message<S>(
    reader: &mut S,
) -> Result<Option<LiveServerMessage>, GeminiError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(message) = reader.next().await {
        match message? {
            Message::Text(text) => {
                return protocol::parse_server_message(text.as_str().as_bytes()).map(Some);
            }
            Message::Binary(bytes) => return protocol::parse_server_message(&bytes).map(Some),
            Message::Close(frame) => {
                debug!(frame = ?frame, "Gemini closed the connection");
                return Ok(None);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
    Ok(None)
}

/// A Gemini Live session over one websocket.
///
/// Writes are serialised through a mutex so the router and the send pump can
/// share the session. The read half is held by at most one turn at a time.
pub struct GeminiLiveSession {
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Arc<Mutex<WsReader>>,
    closed: Arc<AtomicBool>,
}

impl GeminiLiveSession {
    pub(crate) fn new(stream: WsStream) -> Self {
        let (writer, reader) = stream.split();
        Self {
            writer: Mutex::new(writer),
            reader: Arc::new(Mutex::new(reader)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamSession for GeminiLiveSession {
    async fn send(&self, input: &OutboundMessage, end_of_turn: bool) -> Result<(), UpstreamError> {
        if self.is_closed() {
            return Err(UpstreamError::Closed);
        }
        let frame = protocol::input_frame(input, end_of_turn);
        let text = protocol::encode(&frame).map_err(|e| UpstreamError::Send(e.to_string()))?;

        self.writer
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| UpstreamError::Send(e.to_string()))
    }

    async fn receive_turn(&self) -> Result<Option<TurnStream>, UpstreamError> {
        let reader = self.reader.clone().lock_owned().await;
        if self.is_closed() {
            return Ok(None);
        }
        let turn = TurnReader {
            reader,
            pending: VecDeque::new(),
            done: false,
            closed: self.closed.clone(),
        };
        let events = stream::unfold(turn, |mut turn| async move {
            turn.next_event().await.map(|event| (event, turn))
        });
        Ok(Some(events.boxed()))
    }

    async fn close(&self) -> Result<(), UpstreamError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match self.writer.lock().await.close().await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                debug!("Gemini session closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Error closing Gemini session");
                Err(UpstreamError::Send(e.to_string()))
            }
        }
    }
}

/// Reads one model turn off the socket.
struct TurnReader {
    reader: OwnedMutexGuard<WsReader>,
    pending: VecDeque<InboundEvent>,
    done: bool,
    closed: Arc<AtomicBool>,
}

impl TurnReader {
    async fn next_event(&mut self) -> Option<Result<InboundEvent, UpstreamError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }

            let message = match next_server_message(&mut *self.reader).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    self.closed.store(true, Ordering::SeqCst);
                    self.done = true;
                    continue;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into_receive()));
                }
            };

            let decoded = match protocol::decode_server_message(message) {
                Ok(decoded) => decoded,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into_receive()));
                }
            };

            if decoded.interrupted {
                debug!("Gemini turn interrupted");
            }
            if decoded.go_away {
                warn!("Gemini announced it will close the session");
            }
            self.pending.extend(decoded.events);
            self.done = decoded.turn_complete;
        }
    }
}
