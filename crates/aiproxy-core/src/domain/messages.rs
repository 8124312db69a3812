//! Message shapes flowing through a live session.
//!
//! Three families live here:
//!
//! - [`ClientMessage`]: what a client sends over the transport, classified by
//!   its `type` discriminator.
//! - [`OutboundMessage`] / [`InboundEvent`]: provider-neutral payloads going
//!   to and coming from the upstream session.
//! - [`ServerMessage`]: the JSON frames this proxy sends back to the client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mime type of raw 16-bit little-endian PCM audio.
pub const PCM_MIME_TYPE: &str = "audio/pcm";

/// Format label attached to every audio frame sent to the client.
pub const AUDIO_OUTPUT_FORMAT: &str = "pcm16";

/// Sample rate of audio produced by the upstream session.
pub const AUDIO_OUTPUT_SAMPLE_RATE: u32 = 24_000;

// ── Client → proxy ───────────────────────────────────────────────────────────

/// An inbound client message, classified by its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `config`: context fields to merge into the session's client context.
    Config(Map<String, Value>),
    /// `text` or `message`: user text (possibly empty).
    Text(String),
    /// `audio`: the raw `data` value, validated by [`crate::domain::audio`].
    Audio(Value),
    /// `function_result`: forwarded upstream untouched.
    FunctionResult(Value),
    /// Any other (or missing) `type`. Ignored for forward compatibility.
    Unknown(Option<String>),
}

impl ClientMessage {
    /// Classify a decoded JSON frame.
    ///
    /// Never fails: frames that are not objects, or carry an unrecognised
    /// `type`, become [`ClientMessage::Unknown`].
    pub fn from_value(message: Value) -> Self {
        let Value::Object(mut object) = message else {
            return Self::Unknown(None);
        };
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        let data = object.remove("data").unwrap_or(Value::Null);

        match kind.as_deref() {
            Some("config") => match data {
                Value::Object(map) => Self::Config(map),
                _ => {
                    // Fields may sit next to `type` instead of under `data`.
                    object.remove("type");
                    Self::Config(object)
                }
            },
            Some("text" | "message") => Self::Text(extract_text(&data)),
            Some("audio") => Self::Audio(data),
            Some("function_result") => Self::FunctionResult(data),
            _ => Self::Unknown(kind),
        }
    }
}

/// Pull the user text out of a `text`/`message` payload.
///
/// Accepts a bare string or an object with a `text` string field.
fn extract_text(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

// ── Proxy → upstream ─────────────────────────────────────────────────────────

/// A chunk of raw audio bound for the upstream session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Raw audio bytes (already base64-decoded).
    pub data: Vec<u8>,
    /// Mime type of `data`.
    pub mime_type: String,
}

impl AudioChunk {
    /// Wrap raw PCM bytes.
    pub fn pcm(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: PCM_MIME_TYPE.to_string(),
        }
    }
}

/// Provider-neutral input for the upstream session.
///
/// Immutable once created; the outbound queue hands these to the send pump
/// in the order they were pushed.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// User text. Always completes the user's turn.
    Text(String),
    /// Realtime audio. Never completes the user's turn on its own.
    Audio(AudioChunk),
    /// Result of a function the upstream model asked the client to call.
    FunctionResult(Value),
}

impl OutboundMessage {
    /// Whether sending this input signals end-of-turn upstream.
    pub const fn end_of_turn(&self) -> bool {
        match self {
            Self::Text(_) | Self::FunctionResult(_) => true,
            Self::Audio(_) => false,
        }
    }

    /// Short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Audio(_) => "audio",
            Self::FunctionResult(_) => "function_result",
        }
    }
}

// ── Upstream → proxy ─────────────────────────────────────────────────────────

/// A function call requested by the upstream model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Provider-assigned call id, when the provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function name.
    pub name: String,
    /// Call arguments as JSON.
    pub args: Value,
}

/// One decoded event from an upstream turn.
///
/// Provider adapters decode their wire format into this union exactly once;
/// nothing past the adapter boundary inspects provider-specific shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A text delta.
    Text(String),
    /// A chunk of raw audio output.
    Audio {
        /// Raw audio bytes.
        data: Vec<u8>,
        /// Mime type reported by the provider, if any.
        mime_type: Option<String>,
    },
    /// A function call.
    FunctionCall(FunctionCall),
}

impl InboundEvent {
    /// Short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Audio { .. } => "audio",
            Self::FunctionCall(_) => "function_call",
        }
    }
}

// ── Proxy → client ───────────────────────────────────────────────────────────

/// JSON frames sent from the proxy to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges a `config` message with the resolved identity.
    ConfigSuccess {
        message: String,
        client_id: Option<String>,
        ip: Option<String>,
    },
    /// Text produced by the upstream model.
    Response { text: String },
    /// Audio produced by the upstream model, base64 encoded.
    Audio {
        data: String,
        format: String,
        #[serde(rename = "sampleRate")]
        sample_rate: u32,
    },
    /// A function call the client is expected to execute.
    FunctionCall { data: FunctionCall },
    /// Something went wrong.
    Error { data: String },
    /// Informational notice.
    System { data: String },
}

impl ServerMessage {
    /// Acknowledgement for a merged `config` message.
    pub fn config_success(client_id: Option<String>, ip: Option<String>) -> Self {
        Self::ConfigSuccess {
            message: "Configuration acknowledged".to_string(),
            client_id,
            ip,
        }
    }

    /// Upstream audio, encoded for a text-safe transport.
    pub fn audio(data: &[u8]) -> Self {
        Self::Audio {
            data: BASE64.encode(data),
            format: AUDIO_OUTPUT_FORMAT.to_string(),
            sample_rate: AUDIO_OUTPUT_SAMPLE_RATE,
        }
    }

    /// Error notice.
    pub fn error(data: impl Into<String>) -> Self {
        Self::Error { data: data.into() }
    }

    /// Informational notice.
    pub fn system(data: impl Into<String>) -> Self {
        Self::System { data: data.into() }
    }

    /// Normalise one upstream event into the frame sent to the client.
    pub fn from_event(event: InboundEvent) -> Self {
        match event {
            InboundEvent::Text(text) => Self::Response { text },
            InboundEvent::Audio { data, .. } => Self::audio(&data),
            InboundEvent::FunctionCall(call) => Self::FunctionCall { data: call },
        }
    }

    /// The `type` discriminator, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigSuccess { .. } => "config_success",
            Self::Response { .. } => "response",
            Self::Audio { .. } => "audio",
            Self::FunctionCall { .. } => "function_call",
            Self::Error { .. } => "error",
            Self::System { .. } => "system",
        }
    }
}
