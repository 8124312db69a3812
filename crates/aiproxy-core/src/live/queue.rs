//! Outbound queue between the client router and the send pump.
//!
//! An unbounded FIFO: arrival of client audio never waits on upstream send
//! timing. Any number of handles may push; exactly one [`OutboundReceiver`]
//! pops. Shutdown is signalled in-band with [`QueueItem::Shutdown`], which
//! is always the last item the receiver ever sees.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::OutboundMessage;

/// An item popped from the outbound queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem {
    /// A message to forward upstream.
    Message(OutboundMessage),
    /// Stop consuming; do not forward anything.
    Shutdown,
}

/// Errors from pushing onto the outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was shut down or its consumer is gone.
    #[error("Outbound queue is closed")]
    Closed,
}

/// Push handle for the outbound queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    /// `None` once the shutdown sentinel has been pushed.
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<QueueItem>>>>,
}

/// The single consumer of the outbound queue.
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::UnboundedReceiver<QueueItem>,
    finished: bool,
}

/// Create a connected queue/receiver pair.
pub fn outbound_queue() -> (OutboundQueue, OutboundReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        OutboundQueue {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        OutboundReceiver {
            rx,
            finished: false,
        },
    )
}

impl OutboundQueue {
    /// Append a message.
    ///
    /// Fails once [`shutdown`](Self::shutdown) has been called or the
    /// receiver has been dropped.
    pub fn push(&self, message: OutboundMessage) -> Result<(), QueueError> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard.as_ref().ok_or(QueueError::Closed)?;
        tx.send(QueueItem::Message(message))
            .map_err(|_| QueueError::Closed)
    }

    /// Push the shutdown sentinel.
    ///
    /// Returns `false` if the queue was already shut down. No item can be
    /// pushed after the sentinel.
    pub fn shutdown(&self) -> bool {
        let mut guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(tx) => {
                // The receiver may already be gone; the sentinel is moot then.
                let _ = tx.send(QueueItem::Shutdown);
                true
            }
            None => false,
        }
    }

    /// Whether the sentinel has been pushed.
    pub fn is_shut_down(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl OutboundReceiver {
    /// Wait for the next item, in FIFO order.
    ///
    /// After the sentinel has been returned (or every push handle has been
    /// dropped) this keeps returning [`QueueItem::Shutdown`].
    pub async fn pop(&mut self) -> QueueItem {
        if self.finished {
            return QueueItem::Shutdown;
        }
        match self.rx.recv().await {
            Some(QueueItem::Message(message)) => QueueItem::Message(message),
            Some(QueueItem::Shutdown) | None => {
                self.finished = true;
                self.rx.close();
                QueueItem::Shutdown
            }
        }
    }
}
