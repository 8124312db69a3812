//! Receive pump: relays upstream turns to the client.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, error, info};

use super::error::SessionError;
use crate::domain::ServerMessage;
use crate::ports::{TransportSink, UpstreamSession};

/// Relay upstream events to the client, turn after turn.
///
/// Events are forwarded in the order the upstream emits them within a turn.
/// Returns `Ok(())` when the upstream ends the session, and an error when
/// either side fails.
pub async fn run_receive_pump(
    upstream: Arc<dyn UpstreamSession>,
    sink: Arc<dyn TransportSink>,
) -> Result<(), SessionError> {
    let mut turns: u64 = 0;

    loop {
        let mut turn = match upstream.receive_turn().await {
            Ok(Some(turn)) => turn,
            Ok(None) => {
                info!(turns, "Upstream ended the session");
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, "Upstream receive failed");
                return Err(SessionError::UpstreamReceive(e));
            }
        };

        let mut events: u64 = 0;
        while let Some(event) = turn.next().await {
            let event = event.map_err(|e| {
                error!(error = %e, "Upstream turn failed");
                SessionError::UpstreamReceive(e)
            })?;

            let message = ServerMessage::from_event(event);
            debug!(kind = message.kind(), "Relaying upstream event");
            sink.send(&message)
                .await
                .map_err(|_| SessionError::TransportDisconnect)?;
            events += 1;
        }

        turns += 1;
        debug!(turn = turns, events, "Upstream turn complete");
    }
}
