//! Gemini Live `BidiGenerateContent` wire format.
//!
//! Client frames are externally tagged JSON objects (`{"setup": {...}}`,
//! `{"clientContent": {...}}`, ...). Server frames carry at most one of the
//! optional top-level members of [`LiveServerMessage`]. Only the members the
//! proxy acts on are modelled; everything else is ignored on decode.

use aiproxy_core::{
    CapabilityConfig, FunctionCall, InboundEvent, OutboundMessage, ResponseModality, ToolSpec,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::GeminiError;

// ── Client → server ──────────────────────────────────────────────────────────

/// A frame sent to the Gemini Live endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientFrame {
    Setup(Setup),
    ClientContent(ClientContent),
    RealtimeInput(RealtimeInput),
    ToolResponse(ToolResponse),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<ResponseModality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Base64-encoded media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    #[serde(default)]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<Blob>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub function_responses: Vec<Value>,
}

/// Normalise a model name to the `models/...` form the endpoint expects.
pub fn qualified_model_name(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/// Build the `setup` frame for a session.
pub fn setup_frame(model: &str, capabilities: &CapabilityConfig) -> ClientFrame {
    let speech_config = capabilities.voice_name.as_ref().map(|voice| {
        json!({"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": voice}}})
    });

    ClientFrame::Setup(Setup {
        model: qualified_model_name(model),
        generation_config: GenerationConfig {
            response_modalities: capabilities.response_modalities.clone(),
            speech_config,
            temperature: capabilities.temperature,
            max_output_tokens: capabilities.max_output_tokens,
        },
        system_instruction: capabilities.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part {
                text: Some(text.clone()),
                inline_data: None,
            }],
        }),
        tools: capabilities.tools.iter().map(tool_declaration).collect(),
    })
}

fn tool_declaration(tool: &ToolSpec) -> Value {
    match tool {
        ToolSpec::CodeExecution => json!({"codeExecution": {}}),
        ToolSpec::GoogleSearch => json!({"googleSearch": {}}),
        ToolSpec::Functions(declarations) => json!({"functionDeclarations": declarations}),
    }
}

/// Encode one outbound message.
///
/// Text becomes a user turn, audio a realtime media chunk, and function
/// results a tool response.
pub fn input_frame(input: &OutboundMessage, end_of_turn: bool) -> ClientFrame {
    match input {
        OutboundMessage::Text(text) => ClientFrame::ClientContent(ClientContent {
            turns: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(text.clone()),
                    inline_data: None,
                }],
            }],
            turn_complete: end_of_turn,
        }),
        OutboundMessage::Audio(chunk) => ClientFrame::RealtimeInput(RealtimeInput {
            media_chunks: vec![Blob {
                mime_type: Some(chunk.mime_type.clone()),
                data: BASE64.encode(&chunk.data),
            }],
        }),
        OutboundMessage::FunctionResult(result) => ClientFrame::ToolResponse(ToolResponse {
            function_responses: function_responses(result),
        }),
    }
}

/// Accept a list of responses, a wrapper object, or a single response.
fn function_responses(result: &Value) -> Vec<Value> {
    let wrapped = result
        .get("function_responses")
        .or_else(|| result.get("functionResponses"));
    match (wrapped, result) {
        (Some(Value::Array(items)), _) | (None, Value::Array(items)) => items.clone(),
        (Some(single), _) => vec![single.clone()],
        (None, single) => vec![single.clone()],
    }
}

/// Serialise a client frame to JSON text.
pub fn encode(frame: &ClientFrame) -> Result<String, GeminiError> {
    Ok(serde_json::to_string(frame)?)
}

// ── Server → client ──────────────────────────────────────────────────────────

/// A frame received from the Gemini Live endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerMessage {
    #[serde(default)]
    pub setup_complete: Option<Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
    #[serde(default)]
    pub tool_call_cancellation: Option<Value>,
    #[serde(default)]
    pub go_away: Option<Value>,
    #[serde(default)]
    pub usage_metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default)]
    pub function_calls: Vec<WireFunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFunctionCall {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// Events decoded from one server frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    /// Events in relay order: model-turn parts as they arrived, then calls.
    pub events: Vec<InboundEvent>,
    /// The model finished its turn with this frame.
    pub turn_complete: bool,
    /// The model's output was cut off by new user input.
    pub interrupted: bool,
    /// The server acknowledged the `setup` frame.
    pub setup_complete: bool,
    /// The server announced it will close the connection soon.
    pub go_away: bool,
}

/// Parse a server frame.
pub fn parse_server_message(bytes: &[u8]) -> Result<LiveServerMessage, GeminiError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a server frame into provider-neutral events.
///
/// Each model-turn part becomes its own event in part order; a part carrying
/// both inline data and text yields audio then text. Function calls follow.
pub fn decode_server_message(message: LiveServerMessage) -> Result<DecodedFrame, GeminiError> {
    let mut decoded = DecodedFrame {
        setup_complete: message.setup_complete.is_some(),
        go_away: message.go_away.is_some(),
        ..DecodedFrame::default()
    };

    if let Some(content) = message.server_content {
        decoded.turn_complete = content.turn_complete;
        decoded.interrupted = content.interrupted;

        let parts = content.model_turn.map(|turn| turn.parts).unwrap_or_default();
        for part in parts {
            if let Some(blob) = part.inline_data {
                let data = BASE64.decode(blob.data.as_bytes())?;
                if !data.is_empty() {
                    decoded.events.push(InboundEvent::Audio {
                        data,
                        mime_type: blob.mime_type,
                    });
                }
            }
            if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                decoded.events.push(InboundEvent::Text(text));
            }
        }
    }

    if let Some(tool_call) = message.tool_call {
        decoded
            .events
            .extend(tool_call.function_calls.into_iter().map(|call| {
                InboundEvent::FunctionCall(FunctionCall {
                    id: call.id,
                    name: call.name,
                    args: if call.args.is_null() { json!({}) } else { call.args },
                })
            }));
    }

    Ok(decoded)
}
