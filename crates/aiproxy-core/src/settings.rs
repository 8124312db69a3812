//! Live session settings and validation.
//!
//! These are pure domain types with no infrastructure dependencies. The
//! composition root fills them in from the environment and CLI flags; the
//! core only reads them.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{CapabilityConfig, ResponseModality, SessionOptions};
use crate::ports::Credentials;

/// Default upstream model for live sessions.
pub const DEFAULT_LIVE_MODEL: &str = "models/gemini-2.0-flash-exp";

/// Default prebuilt voice for audio output.
pub const DEFAULT_VOICE: &str = "Zephyr";

/// Default port for the proxy HTTP server.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Upper bound accepted for `max_output_tokens`.
pub const MAX_OUTPUT_TOKENS_LIMIT: u32 = 8192;

/// Settings applied to every live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSettings {
    /// Provider API key. Never serialised.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Default upstream model.
    pub model: String,

    /// Prebuilt voice for audio output.
    pub voice: Option<String>,

    /// Output modalities requested from the model.
    pub response_modalities: Vec<ResponseModality>,

    /// System instruction sent at session setup.
    pub system_instruction: Option<String>,

    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,

    /// Output token cap per turn (1–8192).
    pub max_output_tokens: Option<u32>,

    /// Enable code execution unless the request says otherwise.
    pub enable_code_execution: bool,

    /// Enable search unless the request says otherwise.
    pub enable_google_search: bool,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LiveSettings {
    /// Create settings with sensible defaults and no credentials.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_LIVE_MODEL.to_string(),
            voice: Some(DEFAULT_VOICE.to_string()),
            response_modalities: vec![ResponseModality::Audio],
            system_instruction: None,
            temperature: None,
            max_output_tokens: None,
            enable_code_execution: false,
            enable_google_search: false,
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether a non-blank API key is configured.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Resolve provider credentials.
    pub fn credentials(&self) -> Result<Credentials, SettingsError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Credentials::new(key)),
            _ => Err(SettingsError::MissingCredentials),
        }
    }

    /// Default session options derived from these settings.
    pub fn default_session_options(&self) -> SessionOptions {
        SessionOptions {
            enable_code_execution: self.enable_code_execution,
            enable_google_search: self.enable_google_search,
            custom_tools: Vec::new(),
            model: None,
        }
    }

    /// The model to use for a session, honouring a per-session override.
    pub fn effective_model<'a>(&'a self, options: &'a SessionOptions) -> &'a str {
        options
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.model)
    }

    /// Build the capability configuration for one session.
    pub fn capability_config(&self, options: &SessionOptions) -> CapabilityConfig {
        CapabilityConfig {
            response_modalities: self.response_modalities.clone(),
            voice_name: self.voice.clone(),
            system_instruction: self.system_instruction.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            tools: options.build_tools(),
        }
    }
}

/// Errors that can occur during settings validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// No provider API key is configured.
    #[error("GEMINI_API_KEY not found in environment variables")]
    MissingCredentials,

    /// The model name is empty.
    #[error("Model name must not be empty")]
    EmptyModel,

    /// Temperature outside 0.0–2.0.
    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    /// Token cap outside 1–8192.
    #[error("max_output_tokens must be between 1 and {MAX_OUTPUT_TOKENS_LIMIT}, got {0}")]
    InvalidMaxOutputTokens(u32),

    /// No response modality requested.
    #[error("At least one response modality is required")]
    NoResponseModality,
}

/// Validate settings.
///
/// Missing credentials are not a validation error: the server can run
/// without a key and reports the problem to each client that connects.
pub fn validate_settings(settings: &LiveSettings) -> Result<(), SettingsError> {
    if settings.model.trim().is_empty() {
        return Err(SettingsError::EmptyModel);
    }

    if let Some(temperature) = settings.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(SettingsError::InvalidTemperature(temperature));
        }
    }

    if let Some(tokens) = settings.max_output_tokens {
        if tokens == 0 || tokens > MAX_OUTPUT_TOKENS_LIMIT {
            return Err(SettingsError::InvalidMaxOutputTokens(tokens));
        }
    }

    if settings.response_modalities.is_empty() {
        return Err(SettingsError::NoResponseModality);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&LiveSettings::with_defaults()).is_ok());
    }

    #[test]
    fn test_credentials_required() {
        let settings = LiveSettings::with_defaults();
        assert_eq!(
            settings.credentials().unwrap_err(),
            SettingsError::MissingCredentials
        );

        let blank = LiveSettings::with_defaults().with_api_key("   ");
        assert!(!blank.has_credentials());
        assert!(blank.credentials().is_err());

        let ok = LiveSettings::with_defaults().with_api_key("k");
        assert_eq!(ok.credentials().unwrap().api_key(), "k");
    }

    #[test]
    fn test_temperature_bounds() {
        let mut settings = LiveSettings::with_defaults();
        settings.temperature = Some(2.5);
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidTemperature(2.5))
        );

        settings.temperature = Some(0.7);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_max_tokens_bounds() {
        let mut settings = LiveSettings::with_defaults();
        settings.max_output_tokens = Some(0);
        assert!(validate_settings(&settings).is_err());

        settings.max_output_tokens = Some(MAX_OUTPUT_TOKENS_LIMIT + 1);
        assert!(validate_settings(&settings).is_err());

        settings.max_output_tokens = Some(1000);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut settings = LiveSettings::with_defaults();
        settings.model = " ".to_string();
        assert_eq!(validate_settings(&settings), Err(SettingsError::EmptyModel));
    }

    #[test]
    fn test_model_override() {
        let settings = LiveSettings::with_defaults();
        let mut options = settings.default_session_options();
        assert_eq!(settings.effective_model(&options), DEFAULT_LIVE_MODEL);

        options.model = Some("models/other".to_string());
        assert_eq!(settings.effective_model(&options), "models/other");
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let settings = LiveSettings::with_defaults().with_api_key("secret");
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
    }
}
