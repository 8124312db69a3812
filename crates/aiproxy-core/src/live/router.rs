//! Client router: classifies client frames and dispatches them.
//!
//! | Client message     | Action                                           |
//! |--------------------|--------------------------------------------------|
//! | `config`           | merge into context, reply `config_success`       |
//! | `text` / `message` | send upstream directly, end of turn              |
//! | `audio` / binary   | validate, decode, push onto the outbound queue   |
//! | `function_result`  | send upstream directly, end of turn              |
//! | anything else      | ignore                                           |
//!
//! Text and function results bypass the queue and may therefore overtake
//! audio that is still queued.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::SessionError;
use super::queue::OutboundQueue;
use crate::domain::{
    AudioChunk, ClientContext, ClientMessage, OutboundMessage, ServerMessage, decode_client_audio,
};
use crate::ports::{InboundFrame, TransportSink, TransportSource, UpstreamSession};

/// Dispatches client frames for one session.
///
/// The router is the only writer of the session's [`ClientContext`]; other
/// parties observe it through the [`watch::Receiver`] handed out at
/// construction.
pub struct ClientRouter {
    sink: Arc<dyn TransportSink>,
    upstream: Arc<dyn UpstreamSession>,
    queue: OutboundQueue,
    context: watch::Sender<ClientContext>,
}

impl ClientRouter {
    /// Create a router seeded with the handshake context.
    pub fn new(
        sink: Arc<dyn TransportSink>,
        upstream: Arc<dyn UpstreamSession>,
        queue: OutboundQueue,
        context: ClientContext,
    ) -> (Self, watch::Receiver<ClientContext>) {
        let (context, observer) = watch::channel(context);
        (
            Self {
                sink,
                upstream,
                queue,
                context,
            },
            observer,
        )
    }

    /// Read frames until the client disconnects or a fatal error occurs.
    pub async fn run(self, mut source: Box<dyn TransportSource>) -> Result<(), SessionError> {
        loop {
            match source.next_frame().await {
                Ok(Some(frame)) => self.handle_frame(frame).await?,
                Ok(None) => {
                    info!("Client disconnected");
                    return Ok(());
                }
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "Discarding malformed client frame");
                    self.reply(ServerMessage::error(format!("Invalid message: {e}")))
                        .await?;
                }
                Err(e) => {
                    info!(error = %e, "Client transport closed");
                    return Ok(());
                }
            }
        }
    }

    /// Handle one client frame.
    ///
    /// Payload problems are reported to the client and do not end the
    /// session; only fatal errors (upstream send failures, client write
    /// failures) are returned.
    pub async fn handle_frame(&self, frame: InboundFrame) -> Result<(), SessionError> {
        let result = match frame {
            InboundFrame::Json(value) => self.handle_message(ClientMessage::from_value(value)).await,
            InboundFrame::Binary(bytes) => self.handle_binary_audio(bytes).await,
        };
        match result {
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "Rejected client payload");
                match e.client_message() {
                    Some(message) => self.reply(message).await,
                    None => Ok(()),
                }
            }
            other => other,
        }
    }

    async fn handle_message(&self, message: ClientMessage) -> Result<(), SessionError> {
        match message {
            ClientMessage::Config(payload) => {
                self.context.send_modify(|ctx| ctx.merge_config(&payload));
                let (client_id, ip) = {
                    let ctx = self.context.borrow();
                    (ctx.client_id.clone(), ctx.ip.clone())
                };
                info!(client_id = ?client_id, ip = ?ip, "Client context updated");
                self.reply(ServerMessage::config_success(client_id, ip)).await
            }
            ClientMessage::Text(text) if text.is_empty() => {
                debug!("Ignoring empty text message");
                Ok(())
            }
            ClientMessage::Text(text) => self.send_upstream(OutboundMessage::Text(text)).await,
            ClientMessage::FunctionResult(result) => {
                self.send_upstream(OutboundMessage::FunctionResult(result))
                    .await
            }
            ClientMessage::Audio(data) => match decode_client_audio(&data) {
                Ok(chunk) => {
                    self.enqueue(chunk);
                    Ok(())
                }
                Err(rejection) => {
                    warn!(reason = %rejection, "Rejected client audio");
                    self.reply(rejection.to_server_message()).await
                }
            },
            ClientMessage::Unknown(kind) => {
                debug!(kind = ?kind, "Ignoring unknown client message");
                Ok(())
            }
        }
    }

    async fn handle_binary_audio(&self, bytes: Vec<u8>) -> Result<(), SessionError> {
        if bytes.is_empty() {
            return Ok(());
        }
        if bytes.len() % 2 != 0 {
            return Err(SessionError::MalformedClientPayload(format!(
                "PCM16 frames must have an even length, got {} bytes",
                bytes.len()
            )));
        }
        self.enqueue(AudioChunk::pcm(bytes));
        Ok(())
    }

    /// Push audio onto the outbound queue.
    fn enqueue(&self, chunk: AudioChunk) {
        if let Err(e) = self.queue.push(OutboundMessage::Audio(chunk)) {
            // Only happens while the session is tearing down.
            debug!(error = %e, "Dropping audio chunk");
        }
    }

    async fn send_upstream(&self, message: OutboundMessage) -> Result<(), SessionError> {
        debug!(kind = message.kind(), "Forwarding client input upstream");
        self.upstream
            .send(&message, message.end_of_turn())
            .await
            .map_err(SessionError::UpstreamSend)
    }

    async fn reply(&self, message: ServerMessage) -> Result<(), SessionError> {
        self.sink
            .send(&message)
            .await
            .map_err(|_| SessionError::TransportDisconnect)
    }
}
