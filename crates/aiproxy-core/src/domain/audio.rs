//! Validation of client-supplied audio payloads.
//!
//! Clients send audio either as a bare base64 string or as an object such as
//! `{"data": "<b64>", "mime_type": "audio/pcm"}`. Only raw PCM is accepted;
//! compressed codecs (WebM/Opus from `MediaRecorder`) are rejected because no
//! transcoding happens in the proxy.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use thiserror::Error;

use super::messages::{AudioChunk, PCM_MIME_TYPE, ServerMessage};

/// Why a client audio payload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioRejection {
    /// The payload declares a mime type or codec other than raw PCM.
    #[error("Audio requires PCM format - WebM conversion not yet implemented")]
    UnsupportedCodec,

    /// No base64 payload was found.
    #[error("Invalid audio payload: expected base64 data")]
    MissingPayload,

    /// The payload is not valid base64.
    #[error("Invalid base64 audio payload")]
    InvalidBase64,
}

impl AudioRejection {
    /// The frame reported back to the client.
    ///
    /// An unsupported codec is a `system` notice (the client can switch
    /// format); malformed payloads are `error`s.
    pub fn to_server_message(&self) -> ServerMessage {
        match self {
            Self::UnsupportedCodec => ServerMessage::system(self.to_string()),
            Self::MissingPayload | Self::InvalidBase64 => ServerMessage::error(self.to_string()),
        }
    }
}

/// Validate and decode an `audio` message payload.
///
/// Checks run in a fixed order: codec first, then presence of a payload,
/// then base64 decoding. The returned chunk is always tagged as raw PCM.
pub fn decode_client_audio(data: &Value) -> Result<AudioChunk, AudioRejection> {
    let (payload, mime_type, codec) = match data {
        Value::String(s) => (Some(s.as_str()), Some(PCM_MIME_TYPE), None),
        Value::Object(map) => {
            let pick = |keys: &[&str]| {
                keys.iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .filter(|s| !s.is_empty())
            };
            (
                pick(&["base64", "data", "b64"]),
                pick(&["mime_type", "mimeType"]),
                pick(&["format", "codec"]),
            )
        }
        _ => (None, None, None),
    };

    let mime_type = mime_type.unwrap_or(PCM_MIME_TYPE);
    if !is_pcm_mime_type(mime_type) || codec.is_some_and(|c| c.to_lowercase().contains("webm")) {
        return Err(AudioRejection::UnsupportedCodec);
    }

    let payload = payload.ok_or(AudioRejection::MissingPayload)?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| AudioRejection::InvalidBase64)?;

    Ok(AudioChunk::pcm(bytes))
}

/// `audio/pcm`, optionally with parameters such as `;rate=16000`.
fn is_pcm_mime_type(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(PCM_MIME_TYPE)
}
