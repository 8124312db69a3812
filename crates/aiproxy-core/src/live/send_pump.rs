//! Send pump: drains the outbound queue into the upstream session.

use std::sync::Arc;

use tracing::{debug, error};

use super::error::SessionError;
use super::queue::{OutboundReceiver, QueueItem};
use crate::ports::UpstreamSession;

/// Forward queued messages upstream until the shutdown sentinel arrives.
///
/// Messages are sent one at a time in queue order; each send completes
/// before the next pop. Returns `Ok(())` on the sentinel and an error on the
/// first failed send.
pub async fn run_send_pump(
    mut queue: OutboundReceiver,
    upstream: Arc<dyn UpstreamSession>,
) -> Result<(), SessionError> {
    let mut forwarded: u64 = 0;

    loop {
        let message = match queue.pop().await {
            QueueItem::Message(message) => message,
            QueueItem::Shutdown => {
                debug!(forwarded, "Send pump received shutdown");
                return Ok(());
            }
        };

        if let Err(e) = upstream.send(&message, message.end_of_turn()).await {
            error!(kind = message.kind(), error = %e, "Upstream send failed");
            return Err(SessionError::UpstreamSend(e));
        }
        forwarded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudioChunk, OutboundMessage};
    use crate::live::queue::outbound_queue;
    use crate::ports::{TurnStream, UpstreamError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every send; fails once `fail_after` sends have succeeded.
    struct RecordingUpstream {
        sent: Mutex<Vec<(OutboundMessage, bool)>>,
        fail_after: Option<usize>,
    }

    impl RecordingUpstream {
        fn new(fail_after: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_after,
            })
        }
    }

    #[async_trait]
    impl UpstreamSession for RecordingUpstream {
        async fn send(&self, input: &OutboundMessage, end_of_turn: bool) -> Result<(), UpstreamError> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_after.is_some_and(|n| sent.len() >= n) {
                return Err(UpstreamError::Send("socket closed".into()));
            }
            sent.push((input.clone(), end_of_turn));
            Ok(())
        }

        async fn receive_turn(&self) -> Result<Option<TurnStream>, UpstreamError> {
            Ok(None)
        }

        async fn close(&self) -> Result<(), UpstreamError> {
            Ok(())
        }
    }

    fn audio(byte: u8) -> OutboundMessage {
        OutboundMessage::Audio(AudioChunk::pcm(vec![byte, byte]))
    }

    #[tokio::test]
    async fn test_forwards_in_order_with_turn_flags() {
        let upstream = RecordingUpstream::new(None);
        let (queue, rx) = outbound_queue();

        queue.push(audio(1)).unwrap();
        queue.push(audio(2)).unwrap();
        queue
            .push(OutboundMessage::FunctionResult(serde_json::json!({"ok": true})))
            .unwrap();
        queue.shutdown();

        run_send_pump(rx, upstream.clone()).await.unwrap();

        let sent = upstream.sent.lock().unwrap();
        let flags: Vec<bool> = sent.iter().map(|(_, eot)| *eot).collect();
        assert_eq!(flags, vec![false, false, true]);
        assert_eq!(sent[0].0, audio(1));
        assert_eq!(sent[1].0, audio(2));
    }

    #[tokio::test]
    async fn test_nothing_after_sentinel_is_sent() {
        let upstream = RecordingUpstream::new(None);
        let (queue, rx) = outbound_queue();

        queue.push(audio(1)).unwrap();
        queue.shutdown();
        assert!(queue.push(audio(2)).is_err());

        run_send_pump(rx, upstream.clone()).await.unwrap();

        assert_eq!(upstream.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_stops_pump() {
        let upstream = RecordingUpstream::new(Some(1));
        let (queue, rx) = outbound_queue();

        queue.push(audio(1)).unwrap();
        queue.push(audio(2)).unwrap();
        queue.push(audio(3)).unwrap();

        let result = run_send_pump(rx, upstream.clone()).await;

        assert!(matches!(result, Err(SessionError::UpstreamSend(_))));
        assert_eq!(upstream.sent.lock().unwrap().len(), 1);
    }
}
