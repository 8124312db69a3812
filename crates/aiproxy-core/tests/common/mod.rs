//! Shared fakes for live session integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use aiproxy_core::{
    ConnectionMetadata, InboundEvent, InboundFrame, OpenRequest, OutboundMessage, ServerMessage,
    TransportEndpoint, TransportError, TransportSink, TransportSource, TurnStream, UpstreamClient,
    UpstreamError, UpstreamSession,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::{Mutex, mpsc};

/// How long a test waits for an expected event before failing.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

// ── Transport ────────────────────────────────────────────────────────────────

struct ChannelSink {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

#[async_trait]
impl TransportSink for ChannelSink {
    async fn send(&self, message: &ServerMessage) -> Result<(), TransportError> {
        self.tx
            .send(message.clone())
            .map_err(|_| TransportError::Disconnected)
    }
}

struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Result<InboundFrame, TransportError>>,
}

#[async_trait]
impl TransportSource for ChannelSource {
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError> {
        self.rx.recv().await.transpose()
    }
}

/// The test's side of a fake client connection.
pub struct FakeClient {
    frames: Option<mpsc::UnboundedSender<Result<InboundFrame, TransportError>>>,
    received: mpsc::UnboundedReceiver<ServerMessage>,
}

impl FakeClient {
    pub fn send_json(&self, value: serde_json::Value) {
        self.send_frame(Ok(InboundFrame::Json(value)));
    }

    pub fn send_frame(&self, frame: Result<InboundFrame, TransportError>) {
        if let Some(frames) = &self.frames {
            frames.send(frame).expect("session stopped reading");
        }
    }

    /// Close the client side of the connection.
    pub fn disconnect(&mut self) {
        self.frames = None;
    }

    /// Wait for the next message sent to the client.
    pub async fn next_message(&mut self) -> ServerMessage {
        tokio::time::timeout(STEP_TIMEOUT, self.received.recv())
            .await
            .expect("timed out waiting for a client message")
            .expect("session dropped the client sink")
    }

    /// Every message received so far, without waiting.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.received.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Build an endpoint wired to a [`FakeClient`].
pub fn fake_endpoint(metadata: ConnectionMetadata) -> (TransportEndpoint, FakeClient) {
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let endpoint = TransportEndpoint::new(
        metadata,
        Arc::new(ChannelSink { tx: message_tx }),
        Box::new(ChannelSource { rx: frame_rx }),
    );
    let client = FakeClient {
        frames: Some(frame_tx),
        received: message_rx,
    };
    (endpoint, client)
}

// ── Upstream ─────────────────────────────────────────────────────────────────

/// One scripted upstream turn, or a receive failure.
pub type TurnScript = Result<Vec<InboundEvent>, UpstreamError>;

/// Upstream session driven by the test.
pub struct FakeUpstreamSession {
    sends: mpsc::UnboundedSender<(OutboundMessage, bool)>,
    turns: Mutex<mpsc::UnboundedReceiver<TurnScript>>,
    closes: AtomicUsize,
    fail_sends: AtomicBool,
}

#[async_trait]
impl UpstreamSession for FakeUpstreamSession {
    async fn send(&self, input: &OutboundMessage, end_of_turn: bool) -> Result<(), UpstreamError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(UpstreamError::Send("reset".into()));
        }
        self.sends
            .send((input.clone(), end_of_turn))
            .map_err(|_| UpstreamError::Closed)
    }

    async fn receive_turn(&self) -> Result<Option<TurnStream>, UpstreamError> {
        match self.turns.lock().await.recv().await {
            Some(Ok(events)) => Ok(Some(stream::iter(events.into_iter().map(Ok)).boxed())),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), UpstreamError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The test's handle on a [`FakeUpstreamSession`].
pub struct UpstreamControl {
    pub session: Arc<FakeUpstreamSession>,
    turns: Option<mpsc::UnboundedSender<TurnScript>>,
    sends: mpsc::UnboundedReceiver<(OutboundMessage, bool)>,
}

impl UpstreamControl {
    pub fn push_turn(&self, turn: TurnScript) {
        if let Some(turns) = &self.turns {
            turns.send(turn).expect("receive pump stopped");
        }
    }

    /// End the upstream session from the provider side.
    pub fn end_session(&mut self) {
        self.turns = None;
    }

    /// Wait for the next input the session forwarded upstream.
    pub async fn next_send(&mut self) -> (OutboundMessage, bool) {
        tokio::time::timeout(STEP_TIMEOUT, self.sends.recv())
            .await
            .expect("timed out waiting for an upstream send")
            .expect("upstream session dropped")
    }

    /// Make every later upstream send fail.
    pub fn fail_sends(&self) {
        self.session.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn close_count(&self) -> usize {
        self.session.closes.load(Ordering::SeqCst)
    }
}

pub fn fake_upstream_session() -> UpstreamControl {
    let (send_tx, send_rx) = mpsc::unbounded_channel();
    let (turn_tx, turn_rx) = mpsc::unbounded_channel();
    UpstreamControl {
        session: Arc::new(FakeUpstreamSession {
            sends: send_tx,
            turns: Mutex::new(turn_rx),
            closes: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
        }),
        turns: Some(turn_tx),
        sends: send_rx,
    }
}

/// Upstream client that hands out one prepared session.
pub struct FakeUpstreamClient {
    session: Arc<FakeUpstreamSession>,
    pub opened: Mutex<Vec<OpenRequest>>,
}

impl FakeUpstreamClient {
    pub fn new(control: &UpstreamControl) -> Arc<Self> {
        Arc::new(Self {
            session: control.session.clone(),
            opened: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl UpstreamClient for FakeUpstreamClient {
    fn provider_name(&self) -> &str {
        "Fake Live"
    }

    async fn open(&self, request: &OpenRequest) -> Result<Arc<dyn UpstreamSession>, UpstreamError> {
        self.opened.lock().await.push(request.clone());
        Ok(self.session.clone())
    }
}
