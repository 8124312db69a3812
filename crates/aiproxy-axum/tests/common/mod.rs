//! Shared helpers for Axum integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aiproxy_axum::{AxumContext, CorsConfig, ServerConfig, bootstrap_with_upstream, serve};
use aiproxy_core::{
    InboundEvent, OpenRequest, OutboundMessage, TurnStream, UpstreamClient, UpstreamError,
    UpstreamSession,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upstream that answers every input with one turn derived from it.
#[derive(Default)]
pub struct EchoUpstream {
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
}

#[async_trait]
impl UpstreamClient for EchoUpstream {
    fn provider_name(&self) -> &str {
        "Echo Live"
    }

    async fn open(&self, _request: &OpenRequest) -> Result<Arc<dyn UpstreamSession>, UpstreamError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Arc::new(EchoSession {
            turns_tx: std::sync::Mutex::new(Some(tx)),
            turns_rx: Mutex::new(rx),
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct EchoSession {
    turns_tx: std::sync::Mutex<Option<mpsc::UnboundedSender<Vec<InboundEvent>>>>,
    turns_rx: Mutex<mpsc::UnboundedReceiver<Vec<InboundEvent>>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl UpstreamSession for EchoSession {
    async fn send(&self, input: &OutboundMessage, _end_of_turn: bool) -> Result<(), UpstreamError> {
        let turn = match input {
            OutboundMessage::Text(text) => vec![InboundEvent::Text(format!("echo: {text}"))],
            OutboundMessage::Audio(chunk) => vec![InboundEvent::Audio {
                data: chunk.data.clone(),
                mime_type: None,
            }],
            OutboundMessage::FunctionResult(_) => vec![InboundEvent::Text("result".to_string())],
        };
        let guard = self.turns_tx.lock().unwrap();
        let tx = guard.as_ref().ok_or(UpstreamError::Closed)?;
        tx.send(turn).map_err(|_| UpstreamError::Closed)
    }

    async fn receive_turn(&self) -> Result<Option<TurnStream>, UpstreamError> {
        let mut rx = self.turns_rx.lock().await;
        Ok(rx
            .recv()
            .await
            .map(|events| stream::iter(events.into_iter().map(Ok)).boxed()))
    }

    async fn close(&self) -> Result<(), UpstreamError> {
        if self.turns_tx.lock().unwrap().take().is_some() {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Config with credentials so sessions reach the upstream.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::with_defaults();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.live = config.live.with_api_key("test-key");
    config
}

pub fn test_context(upstream: Arc<EchoUpstream>) -> AxumContext {
    bootstrap_with_upstream(&test_config(), upstream, CancellationToken::new()).unwrap()
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub upstream: Arc<EchoUpstream>,
    pub handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let upstream = Arc::new(EchoUpstream::default());
        let shutdown = CancellationToken::new();
        let ctx = bootstrap_with_upstream(&test_config(), upstream.clone(), shutdown.clone())
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move { serve(listener, ctx, &CorsConfig::AllowAll).await });

        Self {
            addr,
            shutdown,
            upstream,
            handle,
        }
    }

    pub fn ws_url(&self, query: &str) -> String {
        format!("ws://{}/api/gemini/ws{query}", self.addr)
    }
}
