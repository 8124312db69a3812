//! Capability configuration for opening an upstream live session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output modality requested from the upstream model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseModality {
    /// Text deltas.
    Text,
    /// Spoken audio.
    Audio,
}

impl ResponseModality {
    /// Parse a modality name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Some(Self::Text),
            "AUDIO" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// A tool made available to the upstream model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolSpec {
    /// Provider-hosted code execution.
    CodeExecution,
    /// Provider-hosted web search.
    GoogleSearch,
    /// Client-executed functions, as provider function declarations.
    Functions(Vec<Value>),
}

/// Per-session capability flags, usually taken from the connect request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// Enable provider-hosted code execution.
    pub enable_code_execution: bool,
    /// Enable provider-hosted search.
    pub enable_google_search: bool,
    /// Client-executed function declarations.
    pub custom_tools: Vec<Value>,
    /// Model override for this session.
    pub model: Option<String>,
}

impl SessionOptions {
    /// Build the tool list for the enabled capabilities.
    ///
    /// Returns an empty list when nothing is enabled.
    pub fn build_tools(&self) -> Vec<ToolSpec> {
        let mut tools = Vec::new();
        if self.enable_code_execution {
            tools.push(ToolSpec::CodeExecution);
        }
        if self.enable_google_search {
            tools.push(ToolSpec::GoogleSearch);
        }
        if !self.custom_tools.is_empty() {
            tools.push(ToolSpec::Functions(self.custom_tools.clone()));
        }
        tools
    }
}

/// Everything the upstream needs to configure a session, minus credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityConfig {
    /// Requested output modalities.
    pub response_modalities: Vec<ResponseModality>,
    /// Prebuilt voice name for audio output.
    pub voice_name: Option<String>,
    /// System instruction for the model.
    pub system_instruction: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Output token cap per turn.
    pub max_output_tokens: Option<u32>,
    /// Enabled tools.
    pub tools: Vec<ToolSpec>,
}
