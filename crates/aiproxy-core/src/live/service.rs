//! Live session service: runs one bridged session per accepted connection.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use super::context_extractor::extract_client_context;
use super::error::SessionError;
use super::queue::outbound_queue;
use super::receive_pump::run_receive_pump;
use super::router::ClientRouter;
use super::send_pump::run_send_pump;
use super::session::{Activity, ExitCause, Session, SessionSummary};
use crate::domain::{ServerMessage, SessionOptions};
use crate::ports::{OpenRequest, TransportEndpoint, TransportSink, UpstreamClient, UpstreamSession};
use crate::settings::LiveSettings;

/// Bridges client transports to upstream live sessions.
///
/// Holds no per-session state; one instance serves every connection.
#[derive(Clone)]
pub struct LiveSessionService {
    upstream: Arc<dyn UpstreamClient>,
    settings: Arc<LiveSettings>,
}

impl LiveSessionService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, settings: LiveSettings) -> Self {
        Self {
            upstream,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.upstream.provider_name()
    }

    /// Run one session to completion.
    ///
    /// Returns once every session activity has stopped and the upstream has
    /// been closed. Cancelling `cancel` tears the session down early.
    pub async fn run(
        &self,
        endpoint: TransportEndpoint,
        options: SessionOptions,
        cancel: CancellationToken,
    ) -> SessionSummary {
        let mut session = Session::new();
        let span = info_span!("live_session", session_id = %session.id());

        let summary = self
            .drive(&mut session, endpoint, &options, &cancel)
            .instrument(span.clone())
            .await;

        span.in_scope(|| {
            info!(
                exit = %summary.exit,
                client_id = ?summary.context.client_id,
                duration_ms = summary.duration().num_milliseconds(),
                "Live session closed"
            );
        });
        summary
    }

    async fn drive(
        &self,
        session: &mut Session,
        endpoint: TransportEndpoint,
        options: &SessionOptions,
        cancel: &CancellationToken,
    ) -> SessionSummary {
        let TransportEndpoint {
            metadata,
            sink,
            source,
        } = endpoint;

        let context = extract_client_context(&metadata, None);
        info!(
            client_id = ?context.client_id,
            ip = ?context.ip,
            app = ?context.app,
            "Live session accepted"
        );

        session.begin_connecting();
        let upstream = match self.connect(options, cancel).await {
            Ok(upstream) => upstream,
            Err(exit) => {
                report_failure(sink.as_ref(), &exit).await;
                session.teardown().await;
                return session.summarize(exit, context);
            }
        };

        let (queue, queue_rx) = outbound_queue();
        session.activate(upstream.clone(), queue.clone());

        let connected = ServerMessage::system(format!("Connected to {}", self.provider_name()));
        if sink.send(&connected).await.is_err() {
            session.teardown().await;
            return session.summarize(ExitCause::ClientDisconnected, context);
        }

        let (router, context_rx) = ClientRouter::new(sink.clone(), upstream.clone(), queue, context);
        session.spawn(Activity::Router, router.run(source));
        session.spawn(Activity::SendPump, run_send_pump(queue_rx, upstream.clone()));
        session.spawn(Activity::ReceivePump, run_receive_pump(upstream, sink.clone()));

        let exit = tokio::select! {
            exit = session.wait_for_exit() => exit.unwrap_or(ExitCause::Cancelled),
            () = cancel.cancelled() => ExitCause::Cancelled,
        };

        session.teardown().await;
        report_failure(sink.as_ref(), &exit).await;

        let context = context_rx.borrow().clone();
        session.summarize(exit, context)
    }

    /// Resolve credentials and open the upstream session.
    async fn connect(
        &self,
        options: &SessionOptions,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn UpstreamSession>, ExitCause> {
        let credentials = self.settings.credentials().map_err(|e| {
            warn!(error = %e, "Live session rejected");
            ExitCause::Failed(e.into())
        })?;

        let request = OpenRequest {
            model: self.settings.effective_model(options).to_string(),
            credentials,
            capabilities: self.settings.capability_config(options),
        };
        info!(
            provider = self.provider_name(),
            model = %request.model,
            tools = request.capabilities.tools.len(),
            "Opening upstream session"
        );

        tokio::select! {
            opened = self.upstream.open(&request) => opened.map_err(|e| {
                error!(error = %e, "Failed to open upstream session");
                ExitCause::Failed(SessionError::UpstreamConnect(e))
            }),
            () = cancel.cancelled() => Err(ExitCause::Cancelled),
        }
    }
}

/// Tell the client why the session ended, when there is something to say.
async fn report_failure(sink: &dyn TransportSink, exit: &ExitCause) {
    let Some(message) = exit.error().and_then(SessionError::client_message) else {
        return;
    };
    if let Err(e) = sink.send(&message).await {
        warn!(error = %e, "Could not report session failure to client");
    }
}
