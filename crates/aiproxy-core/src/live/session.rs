//! Session lifecycle: state, owned resources and teardown.
//!
//! A [`Session`] owns the upstream handle, the outbound queue and the three
//! concurrent activities (router, send pump, receive pump). Whichever
//! activity finishes first ends the session; [`Session::teardown`] then stops
//! the rest and closes the upstream exactly once.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, warn};
use uuid::Uuid;

use super::error::SessionError;
use super::queue::OutboundQueue;
use crate::domain::ClientContext;
use crate::ports::UpstreamSession;

/// Lifecycle state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Init,
    Connecting,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The concurrent activities of an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Router,
    SendPump,
    ReceivePump,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Router => "router",
            Self::SendPump => "send_pump",
            Self::ReceivePump => "receive_pump",
        })
    }
}

/// Why a session ended.
#[derive(Debug)]
pub enum ExitCause {
    /// The client closed the connection.
    ClientDisconnected,
    /// The upstream ended the session.
    UpstreamEnded,
    /// The send pump consumed the shutdown sentinel.
    QueueDrained,
    /// The session was cancelled from outside (e.g. server shutdown).
    Cancelled,
    /// A fatal error.
    Failed(SessionError),
}

impl ExitCause {
    /// Map an activity's result to the reason the session ends.
    pub fn from_activity(activity: Activity, result: Result<(), SessionError>) -> Self {
        match (activity, result) {
            (_, Err(SessionError::TransportDisconnect)) | (Activity::Router, Ok(())) => {
                Self::ClientDisconnected
            }
            (Activity::SendPump, Ok(())) => Self::QueueDrained,
            (Activity::ReceivePump, Ok(())) => Self::UpstreamEnded,
            (_, Err(e)) => Self::Failed(e),
        }
    }

    /// The error behind this exit, if it was a failure.
    pub const fn error(&self) -> Option<&SessionError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientDisconnected => f.write_str("client disconnected"),
            Self::UpstreamEnded => f.write_str("upstream ended"),
            Self::QueueDrained => f.write_str("queue drained"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Outcome of one live session, returned once it has fully closed.
#[derive(Debug)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub final_state: SessionState,
    pub exit: ExitCause,
    /// Client context as last seen by the router.
    pub context: ClientContext,
}

impl SessionSummary {
    /// Wall-clock duration of the session.
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

type ActivityResult = (Activity, Result<(), SessionError>);

/// One client connection paired with one upstream session.
pub struct Session {
    id: String,
    state: SessionState,
    started_at: DateTime<Utc>,
    upstream: Option<Arc<dyn UpstreamSession>>,
    queue: Option<OutboundQueue>,
    tasks: JoinSet<ActivityResult>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session in [`SessionState::Init`] with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::Init,
            started_at: Utc::now(),
            upstream: None,
            queue: None,
            tasks: JoinSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn advance(&mut self, next: SessionState) {
        if next > self.state {
            debug!(from = %self.state, to = %next, "Session state change");
            self.state = next;
        }
    }

    /// Enter [`SessionState::Connecting`].
    pub fn begin_connecting(&mut self) {
        self.advance(SessionState::Connecting);
    }

    /// Take ownership of the opened upstream and queue; enter
    /// [`SessionState::Active`].
    pub fn activate(&mut self, upstream: Arc<dyn UpstreamSession>, queue: OutboundQueue) {
        self.upstream = Some(upstream);
        self.queue = Some(queue);
        self.advance(SessionState::Active);
    }

    /// Run an activity as part of this session.
    ///
    /// The activity inherits the current tracing span.
    pub fn spawn<F>(&mut self, activity: Activity, fut: F)
    where
        F: Future<Output = Result<(), SessionError>> + Send + 'static,
    {
        self.tasks
            .spawn(async move { (activity, fut.await) }.in_current_span());
    }

    /// Wait for the first activity to finish.
    ///
    /// Returns `None` when no activity is running.
    pub async fn wait_for_exit(&mut self) -> Option<ExitCause> {
        let joined = self.tasks.join_next().await?;
        Some(match joined {
            Ok((activity, result)) => {
                debug!(%activity, ok = result.is_ok(), "Session activity finished");
                ExitCause::from_activity(activity, result)
            }
            Err(e) if e.is_panic() => {
                ExitCause::Failed(SessionError::Internal(format!("session activity panicked: {e}")))
            }
            Err(_) => ExitCause::Cancelled,
        })
    }

    /// Stop everything and release the upstream.
    ///
    /// Pushes the shutdown sentinel, cancels and awaits all activities, then
    /// closes the upstream once. Safe to call more than once and from any
    /// state; only the first call does any work. Returns whether this call
    /// performed the teardown.
    pub async fn teardown(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.advance(SessionState::Closing);

        if let Some(queue) = self.queue.take() {
            queue.shutdown();
        }

        self.tasks.abort_all();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!(error = %e, "Session activity panicked during teardown");
                }
            }
        }

        if let Some(upstream) = self.upstream.take() {
            if let Err(e) = upstream.close().await {
                warn!(error = %e, "Failed to close upstream session");
            }
        }

        self.advance(SessionState::Closed);
        true
    }

    /// Build the summary for a finished session.
    pub fn summarize(&self, exit: ExitCause, context: ClientContext) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            final_state: self.state,
            exit,
            context,
        }
    }
}
