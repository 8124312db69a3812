//! Config command handler.
//!
//! Prints the resolved configuration. The API key is never shown.

use std::io::Write;

use aiproxy_axum::{CorsConfig, ServerConfig};
use aiproxy_core::validate_settings;

use crate::error::CliError;

/// Print `config` to stdout and report validation problems.
pub fn execute(config: &ServerConfig) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    render(config, &mut stdout.lock())
}

/// Write the configuration report.
///
/// Returns a config error after printing when the settings are invalid.
pub fn render(config: &ServerConfig, out: &mut impl Write) -> Result<(), CliError> {
    let live = &config.live;
    let on_off = |flag: bool| if flag { "on" } else { "off" };

    writeln!(out, "aiproxy configuration")?;
    writeln!(out, "  listen:          {}", config.bind_address())?;
    match &config.cors {
        CorsConfig::AllowAll => writeln!(out, "  cors:            all origins")?,
        CorsConfig::AllowOrigins(origins) => {
            writeln!(out, "  cors:            {}", origins.join(", "))?;
        }
    }
    writeln!(
        out,
        "  api key:         {}",
        if live.has_credentials() { "set (redacted)" } else { "not set" }
    )?;
    writeln!(out, "  model:           {}", live.model)?;
    writeln!(
        out,
        "  voice:           {}",
        live.voice.as_deref().unwrap_or("(provider default)")
    )?;
    if let Some(instruction) = &live.system_instruction {
        writeln!(out, "  instruction:     {instruction}")?;
    }
    if let Some(temperature) = live.temperature {
        writeln!(out, "  temperature:     {temperature}")?;
    }
    if let Some(tokens) = live.max_output_tokens {
        writeln!(out, "  max tokens:      {tokens}")?;
    }
    writeln!(out, "  code execution:  {}", on_off(live.enable_code_execution))?;
    writeln!(out, "  google search:   {}", on_off(live.enable_google_search))?;
    writeln!(out, "  gemini endpoint: {}", config.gemini.endpoint)?;
    writeln!(
        out,
        "  setup timeout:   {}s",
        config.gemini.setup_timeout.as_secs()
    )?;

    if !live.has_credentials() {
        writeln!(out)?;
        writeln!(out, "⚠ GEMINI_API_KEY is not set; sessions will be rejected.")?;
    }

    if let Err(e) = validate_settings(live) {
        writeln!(out)?;
        writeln!(out, "✗ {e}")?;
        return Err(e.into());
    }

    writeln!(out)?;
    writeln!(out, "✓ Configuration is valid.")?;
    Ok(())
}
