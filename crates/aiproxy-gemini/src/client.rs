//! Gemini Live client: opens sessions against the `BidiGenerateContent`
//! websocket endpoint.

use std::sync::{Arc, Once};
use std::time::Duration;

use aiproxy_core::{OpenRequest, UpstreamClient, UpstreamError, UpstreamSession};
use async_trait::async_trait;
use futures_util::SinkExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::error::GeminiError;
use crate::protocol;
use crate::session::{GeminiLiveSession, WsStream, next_server_message};

/// Production Gemini Live endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Default time allowed for connect plus setup handshake.
pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Gemini client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    /// Websocket endpoint; the API key is appended as the `key` query parameter.
    pub endpoint: String,
    /// Budget for each of connect and setup.
    pub setup_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
        }
    }
}

/// [`UpstreamClient`] for Gemini Live.
#[derive(Debug, Clone, Default)]
pub struct GeminiLiveClient {
    config: GeminiConfig,
}

impl GeminiLiveClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn connect(&self, request: &OpenRequest) -> Result<WsStream, GeminiError> {
        install_crypto_provider();

        let url = format!(
            "{}?key={}",
            self.config.endpoint,
            request.credentials.api_key()
        );
        let timeout = self.config.setup_timeout;

        let (mut stream, _response) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| GeminiError::Timeout(timeout, "websocket connect"))??;

        let setup = protocol::setup_frame(&request.model, &request.capabilities);
        stream
            .send(Message::Text(protocol::encode(&setup)?.into()))
            .await?;

        tokio::time::timeout(timeout, await_setup_complete(&mut stream))
            .await
            .map_err(|_| GeminiError::Timeout(timeout, "setupComplete"))??;

        Ok(stream)
    }
}

/// Skip frames until the server acknowledges `setup`.
async fn await_setup_complete(stream: &mut WsStream) -> Result<(), GeminiError> {
    loop {
        let Some(message) = next_server_message(stream).await? else {
            return Err(GeminiError::ClosedDuring("setup"));
        };
        if message.setup_complete.is_some() {
            return Ok(());
        }
        debug!("Ignoring frame received before setupComplete");
    }
}

/// Select the process-wide rustls provider once.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Another component may have installed one already; either is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

#[async_trait]
impl UpstreamClient for GeminiLiveClient {
    fn provider_name(&self) -> &str {
        "Gemini Live"
    }

    async fn open(&self, request: &OpenRequest) -> Result<Arc<dyn UpstreamSession>, UpstreamError> {
        let model = protocol::qualified_model_name(&request.model);
        let stream = self
            .connect(request)
            .await
            .map_err(GeminiError::into_connect)?;

        info!(model = %model, "Gemini Live session established");
        Ok(Arc::new(GeminiLiveSession::new(stream)))
    }
}
