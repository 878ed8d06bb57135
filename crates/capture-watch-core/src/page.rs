//! One monitored page: its host, its Status Engine and its messaging channel.

use crate::{
    PipelineTiming, intercept,
    host::HostEnvironment,
    relay::{ContextId, PageChannel, PageMessage, PageMessageBody},
    status::{StatusEngine, new_listener},
};

use std::sync::Arc;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// The privileged side of a monitored page.
///
/// Construction installs interception into the host, mirrors every Status
/// Engine transition onto the page channel, and starts the responder that
/// answers direct state requests.
pub struct PageContext {
    id: ContextId,
    host: HostEnvironment,
    engine: Arc<StatusEngine>,
    channel: PageChannel,
    responder: JoinHandle<()>,
}

impl PageContext {
    /// Attach to `host`. Must be called from within a tokio runtime.
    pub fn attach(mut host: HostEnvironment, timing: PipelineTiming) -> Self {
        let id = ContextId::new();
        let channel = PageChannel::default();
        let engine = intercept::install(&mut host, timing);

        let emitter = channel.clone();
        engine.subscribe(new_listener(move |change| {
            // Nobody listening is fine, the page keeps working.
            let _ = emitter.post(PageMessage {
                origin: id,
                body: PageMessageBody::StatusEvent(change.clone()),
            });
        }));

        let requests = channel.subscribe();
        let responder = tokio::spawn(respond_to_state_requests(
            id,
            channel.clone(),
            requests,
            Arc::clone(&engine),
        ));

        info!(context_id = %id, "Page context attached");

        Self {
            id,
            host,
            engine,
            channel,
            responder,
        }
    }

    /// Origin id used on the page channel.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The intercepted host, as page scripts see it.
    pub fn host(&self) -> &HostEnvironment {
        &self.host
    }

    /// The page's Status Engine.
    pub fn engine(&self) -> &Arc<StatusEngine> {
        &self.engine
    }

    /// The page's messaging channel.
    pub fn channel(&self) -> &PageChannel {
        &self.channel
    }
}

impl Drop for PageContext {
    fn drop(&mut self) {
        self.responder.abort();
        debug!(context_id = %self.id, "Page context detached");
    }
}

async fn respond_to_state_requests(
    id: ContextId,
    channel: PageChannel,
    mut rx: broadcast::Receiver<PageMessage>,
    engine: Arc<StatusEngine>,
) {
    loop {
        match rx.recv().await {
            Ok(PageMessage {
                body: PageMessageBody::StateRequest { correlation_id },
                ..
            }) => {
                debug!(correlation_id = %correlation_id, "Answering state request");
                let _ = channel.post(PageMessage {
                    origin: id,
                    body: PageMessageBody::StateResponse {
                        correlation_id,
                        state: engine.snapshot(),
                    },
                });
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Page responder lagged behind the page channel");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
