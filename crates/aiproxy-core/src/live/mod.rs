//! Live session relay.
//!
//! Bridges one client transport endpoint to one upstream streaming session.
//! Three activities run concurrently per session:
//!
//! - the [`ClientRouter`] reads client frames, answers `config`, sends text
//!   and function results upstream directly and queues audio;
//! - the send pump drains the [`OutboundQueue`] into the upstream;
//! - the receive pump relays upstream turns back to the client.
//!
//! The first activity to stop ends the session.

mod context_extractor;
mod error;
mod queue;
mod receive_pump;
mod router;
mod send_pump;
mod service;
mod session;

pub use context_extractor::{extract_client_context, resolve_client_ip};
pub use error::SessionError;
pub use queue::{OutboundQueue, OutboundReceiver, QueueError, QueueItem, outbound_queue};
pub use receive_pump::run_receive_pump;
pub use router::ClientRouter;
pub use send_pump::run_send_pump;
pub use service::LiveSessionService;
pub use session::{Activity, ExitCause, Session, SessionState, SessionSummary};
