//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the Axum web adapter. The concrete upstream client is instantiated here.

use std::net::SocketAddr;
use std::sync::Arc;

use aiproxy_core::{
    DEFAULT_SERVER_PORT, LiveSessionService, LiveSettings, UpstreamClient, validate_settings,
};
use aiproxy_gemini::{GeminiConfig, GeminiLiveClient};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Settings applied to every live session.
    pub live: LiveSettings,
    /// Gemini endpoint and handshake budget.
    pub gemini: GeminiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ServerConfig {
    /// Create config listening on all interfaces with default settings.
    pub fn with_defaults() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_SERVER_PORT,
            cors: CorsConfig::default(),
            live: LiveSettings::with_defaults(),
            gemini: GeminiConfig::default(),
        }
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application context for the Axum adapter.
///
/// Holds the live session service and the shutdown token every session
/// derives its cancellation from.
pub struct AxumContext {
    /// Bridges websocket clients to upstream sessions.
    pub live: LiveSessionService,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl AxumContext {
    pub fn new(live: LiveSessionService, shutdown: CancellationToken) -> Self {
        Self { live, shutdown }
    }
}

/// Bootstrap the Axum server with the Gemini upstream.
pub fn bootstrap(config: &ServerConfig, shutdown: CancellationToken) -> Result<AxumContext> {
    let upstream: Arc<dyn UpstreamClient> = Arc::new(GeminiLiveClient::new(config.gemini.clone()));
    bootstrap_with_upstream(config, upstream, shutdown)
}

/// Bootstrap with an explicit upstream client.
pub fn bootstrap_with_upstream(
    config: &ServerConfig,
    upstream: Arc<dyn UpstreamClient>,
    shutdown: CancellationToken,
) -> Result<AxumContext> {
    validate_settings(&config.live).context("invalid live settings")?;

    if !config.live.has_credentials() {
        warn!("GEMINI_API_KEY is not set; live sessions will be rejected");
    }

    info!(
        provider = upstream.provider_name(),
        model = %config.live.model,
        voice = ?config.live.voice,
        code_execution = config.live.enable_code_execution,
        google_search = config.live.enable_google_search,
        "Axum bootstrap configured live sessions"
    );

    let live = LiveSessionService::new(upstream, config.live.clone());
    Ok(AxumContext::new(live, shutdown))
}

/// Serve on an already-bound listener until the context's shutdown token fires.
pub async fn serve(listener: TcpListener, ctx: AxumContext, cors: &CorsConfig) -> Result<()> {
    let addr = listener.local_addr()?;
    let shutdown = ctx.shutdown.clone();
    let app = crate::routes::create_router(ctx, cors);

    info!("aiproxy listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;

    info!("aiproxy shut down");
    Ok(())
}

/// Start the web server and run until `shutdown` is cancelled.
pub async fn start_server(config: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    let ctx = bootstrap(&config, shutdown)?;

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve(listener, ctx, &config.cors).await
}
