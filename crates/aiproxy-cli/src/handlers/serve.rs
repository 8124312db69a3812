//! Serve command handler.

use aiproxy_axum::{ServerConfig, start_server};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;

/// Run the server until Ctrl-C.
pub async fn execute(config: ServerConfig) -> Result<(), CliError> {
    let shutdown = CancellationToken::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    start_server(config, shutdown)
        .await
        .map_err(|e| CliError::Server(format!("{e:#}")))
}
