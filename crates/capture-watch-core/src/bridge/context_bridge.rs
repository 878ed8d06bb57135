use crate::{
    CaptureError, CoreResult, PipelineTiming,
    coordinator::CoordinatorLink,
    page::PageContext,
    relay::{
        ContextId, PageChannel, PageEvent, PageMessage, PageMessageBody, PageStateReply,
        RelayEnvelope,
    },
    status::{StatusChange, StatusSnapshot, now_ms},
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc, oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

const COMMAND_CAPACITY: usize = 16;

/// A request addressed to a bridge.
#[derive(Debug)]
pub struct BridgeCommand {
    /// The request, currently only [`RelayEnvelope::RequestPageState`].
    pub envelope: RelayEnvelope,
    /// Where the answer goes.
    pub reply: oneshot::Sender<RelayEnvelope>,
}

/// Consumer-facing handle to one page's bridge.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeCommand>,
}

impl BridgeHandle {
    /// Fetch the page's live state, bypassing the Coordinator's cache.
    ///
    /// A page that does not answer in time yields a failed reply, not an error.
    #[instrument(skip(self))]
    pub async fn request_page_state(&self) -> CoreResult<PageStateReply> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(BridgeCommand {
                envelope: RelayEnvelope::RequestPageState {
                    correlation_id: None,
                },
                reply: reply_tx,
            })
            .await
            .map_err(|_| CaptureError::ChannelClosed {
                channel: "bridge",
                location: ErrorLocation::from(Location::caller()),
            })?;

        match reply_rx.await {
            Ok(RelayEnvelope::PageState { reply, .. }) => Ok(reply),
            Ok(other) => Err(CaptureError::UnexpectedReply {
                expected: "PageState",
                actual: other.kind(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(_) => Err(CaptureError::ResponseDropped {
                request: "RequestPageState",
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Relay between one page context and the Coordinator.
pub struct ContextBridge {
    context_id: ContextId,
    channel: PageChannel,
    page_rx: broadcast::Receiver<PageMessage>,
    link: CoordinatorLink,
    timing: PipelineTiming,
    commands: mpsc::Receiver<BridgeCommand>,
}

impl ContextBridge {
    /// Attach a bridge to `page`.
    pub fn attach(
        page: &PageContext,
        link: CoordinatorLink,
        timing: PipelineTiming,
    ) -> (BridgeHandle, JoinHandle<()>) {
        Self::spawn(page.id(), page.channel().clone(), link, timing)
    }

    /// Start a bridge for the page context `context_id` talking over `channel`.
    ///
    /// Only messages originating from `context_id` are trusted.
    pub fn spawn(
        context_id: ContextId,
        channel: PageChannel,
        link: CoordinatorLink,
        timing: PipelineTiming,
    ) -> (BridgeHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        // Subscribe before returning so no transition after attach is missed.
        let page_rx = channel.subscribe();

        let bridge = Self {
            context_id,
            channel,
            page_rx,
            link,
            timing,
            commands,
        };

        (BridgeHandle { tx }, tokio::spawn(bridge.run()))
    }

    #[instrument(skip(self), fields(context_id = %self.context_id))]
    async fn run(mut self) {
        info!(tab_id = ?self.link.sender().tab_id, "Context bridge started");

        loop {
            tokio::select! {
                message = self.page_rx.recv() => match message {
                    Ok(message) => self.on_page_message(message).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Bridge lagged behind the page channel, events lost");
                    }
                    Err(RecvError::Closed) => break,
                },

                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }

        info!("Context bridge stopped");
    }

    async fn on_page_message(&self, message: PageMessage) {
        if message.origin != self.context_id {
            trace!(origin = %message.origin, "Ignoring message from foreign context");
            return;
        }

        let PageMessageBody::StatusEvent(change) = message.body else {
            return;
        };

        let envelope = RelayEnvelope::PageEvent(page_event(change));
        if let Err(e) = self.link.forward(envelope).await {
            warn!(error = %e, "Failed to forward page event");
        }
    }

    fn on_command(&self, command: BridgeCommand) {
        let BridgeCommand { envelope, reply } = command;

        if !matches!(envelope, RelayEnvelope::RequestPageState { .. }) {
            warn!(kind = envelope.kind(), "Bridge ignoring unexpected request");
            return;
        }

        let context_id = self.context_id;
        let channel = self.channel.clone();
        let timeout = self.timing.page_query_timeout;

        tokio::spawn(async move {
            let (correlation_id, page_reply) =
                fetch_page_state(context_id, &channel, timeout).await;
            let _ = reply.send(RelayEnvelope::PageState {
                correlation_id: Some(correlation_id),
                reply: page_reply,
            });
        });
    }
}

fn page_event(change: StatusChange) -> PageEvent {
    PageEvent {
        tab_id_hint: None,
        status: change.status,
        detail: Some(change.detail),
        timestamp_ms: Some(now_ms()),
    }
}

/// One correlated state request into the page.
///
/// The listener subscribes before the request is posted and is dropped as
/// soon as the exchange resolves or times out.
async fn fetch_page_state(
    context_id: ContextId,
    channel: &PageChannel,
    timeout: Duration,
) -> (Uuid, PageStateReply) {
    let correlation_id = Uuid::new_v4();
    let mut listener = channel.subscribe();

    let _ = channel.post(PageMessage {
        origin: context_id,
        body: PageMessageBody::StateRequest { correlation_id },
    });
    debug!(correlation_id = %correlation_id, "Page state requested");

    let reply = match tokio::time::timeout(
        timeout,
        await_response(&mut listener, context_id, correlation_id),
    )
    .await
    {
        Ok(Some(state)) => PageStateReply::answered(state),
        Ok(None) => PageStateReply::failed("page channel closed"),
        Err(_) => {
            warn!(
                correlation_id = %correlation_id,
                timeout_ms = timeout.as_millis(),
                "Page did not answer state request"
            );
            PageStateReply::failed(format!(
                "no response from page within {}ms",
                timeout.as_millis()
            ))
        }
    };

    (correlation_id, reply)
}

async fn await_response(
    listener: &mut broadcast::Receiver<PageMessage>,
    context_id: ContextId,
    correlation_id: Uuid,
) -> Option<StatusSnapshot> {
    loop {
        match listener.recv().await {
            Ok(PageMessage {
                origin,
                body:
                    PageMessageBody::StateResponse {
                        correlation_id: answered,
                        state,
                    },
            }) => {
                if answered != correlation_id {
                    trace!(answered = %answered, "Ignoring response for another request");
                } else if origin != context_id {
                    warn!(origin = %origin, "Ignoring state response from foreign context");
                } else {
                    return Some(state);
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "State listener lagged, still waiting");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
