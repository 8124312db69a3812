//! Domain types for the live session relay.
//!
//! Pure data: no I/O, no async, no adapter types.

pub mod audio;
pub mod capabilities;
pub mod context;
pub mod messages;

pub use audio::{AudioRejection, decode_client_audio};
pub use capabilities::{CapabilityConfig, ResponseModality, SessionOptions, ToolSpec};
pub use context::{CONTEXT_FIELDS, ClientContext};
pub use messages::{
    AUDIO_OUTPUT_FORMAT, AUDIO_OUTPUT_SAMPLE_RATE, AudioChunk, ClientMessage, FunctionCall,
    InboundEvent, OutboundMessage, PCM_MIME_TYPE, ServerMessage,
};
