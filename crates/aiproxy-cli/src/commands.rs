//! Commands enum and shared server arguments.

use clap::{Args, Subcommand};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the proxy server until Ctrl-C
    Serve(ServerArgs),

    /// Print the resolved configuration and report validation errors
    Config(ServerArgs),
}

/// Server options. Flags override the matching environment variables.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Interface to bind
    #[arg(long, env = "AIPROXY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "AIPROXY_PORT", default_value_t = aiproxy_core::DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Allowed CORS origin (repeatable or comma separated; all origins when omitted)
    #[arg(
        long = "cors-origin",
        env = "AIPROXY_CORS_ORIGINS",
        value_delimiter = ','
    )]
    pub cors_origins: Vec<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default upstream model
    #[arg(long, env = "AIPROXY_MODEL")]
    pub model: Option<String>,

    /// Prebuilt voice for audio output
    #[arg(long, env = "AIPROXY_VOICE")]
    pub voice: Option<String>,

    /// System instruction sent when a session starts
    #[arg(long, env = "AIPROXY_SYSTEM_INSTRUCTION")]
    pub system_instruction: Option<String>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output token cap per turn
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Enable code execution unless the client asks otherwise
    #[arg(long)]
    pub code_execution: bool,

    /// Enable Google search unless the client asks otherwise
    #[arg(long)]
    pub google_search: bool,

    /// Override the Gemini Live websocket endpoint
    #[arg(long, env = "AIPROXY_GEMINI_ENDPOINT")]
    pub gemini_endpoint: Option<String>,

    /// Seconds allowed for the upstream connect and setup handshake
    #[arg(long, default_value_t = 15)]
    pub setup_timeout_secs: u64,
}
