//! CLI bootstrap - the composition root.
//!
//! Resolves flags and environment into the server configuration and sets up
//! logging. Command handlers receive the finished [`ServerConfig`].

use std::time::Duration;

use aiproxy_axum::{CorsConfig, ServerConfig};
use aiproxy_core::validate_settings;
use tracing_subscriber::EnvFilter;

use crate::commands::ServerArgs;
use crate::error::CliError;

/// Build the server configuration from parsed arguments.
///
/// Fails on values no session could use; a missing API key is allowed.
pub fn server_config(args: &ServerArgs) -> Result<ServerConfig, CliError> {
    let mut config = ServerConfig::with_defaults();
    config.host.clone_from(&args.host);
    config.port = args.port;

    let origins: Vec<String> = args
        .cors_origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(ToString::to_string)
        .collect();
    if !origins.is_empty() {
        config.cors = CorsConfig::AllowOrigins(origins);
    }

    let live = &mut config.live;
    live.api_key = args
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string);
    if let Some(model) = &args.model {
        live.model.clone_from(model);
    }
    if let Some(voice) = &args.voice {
        live.voice = Some(voice.clone()).filter(|v| !v.trim().is_empty());
    }
    live.system_instruction.clone_from(&args.system_instruction);
    live.temperature = args.temperature;
    live.max_output_tokens = args.max_output_tokens;
    live.enable_code_execution = args.code_execution;
    live.enable_google_search = args.google_search;

    if let Some(endpoint) = &args.gemini_endpoint {
        config.gemini.endpoint.clone_from(endpoint);
    }
    if args.setup_timeout_secs == 0 {
        return Err(CliError::Arguments(
            "--setup-timeout-secs must be at least 1".to_string(),
        ));
    }
    config.gemini.setup_timeout = Duration::from_secs(args.setup_timeout_secs);

    Ok(config)
}

/// Like [`server_config`], additionally validating the live settings.
pub fn validated_server_config(args: &ServerArgs) -> Result<ServerConfig, CliError> {
    let config = server_config(args)?;
    validate_settings(&config.live)?;
    Ok(config)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        "info,tower_http=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
