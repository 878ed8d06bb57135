//! Coordinator actor and its handles.
//!
//! The actor owns the [`TabRegistry`] exclusively. Everything else talks to
//! it through [`CoordinatorHandle`] (consumers, lifecycle) or
//! [`CoordinatorLink`] (a page's bridge, stamped with transport metadata).

use crate::{
    CaptureError, CoreResult,
    coordinator::{Indicator, IndicatorStyle, TabRegistry},
    relay::{PageEvent, RelayEnvelope, SenderMeta, StatusRecord, TabEntry, TabId},
    status::{Status, now_ms},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

/// Default capacity of the Coordinator's inbound channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// One delivery to the Coordinator.
#[derive(Debug)]
pub struct CoordinatorMessage {
    /// Transport metadata of the sender.
    pub sender: SenderMeta,
    /// The message.
    pub envelope: RelayEnvelope,
    /// Where to send the answer, for request/response kinds.
    pub reply: Option<oneshot::Sender<RelayEnvelope>>,
}

/// Process-wide status registry.
pub struct Coordinator {
    registry: TabRegistry,
    indicator: Arc<dyn Indicator>,
    style: IndicatorStyle,
    inbound: mpsc::Receiver<CoordinatorMessage>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Coordinator {
    /// Start the Coordinator on the current runtime.
    pub fn spawn(
        indicator: Arc<dyn Indicator>,
        style: IndicatorStyle,
        capacity: usize,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, inbound) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let coordinator = Self {
            registry: TabRegistry::new(),
            indicator,
            style,
            inbound,
            shutdown_rx,
        };

        let handle = CoordinatorHandle {
            tx,
            shutdown_tx: Arc::new(shutdown_tx),
        };

        (handle, tokio::spawn(coordinator.run()))
    }

    #[instrument(skip(self))]
    async fn run(mut self) {
        info!("Coordinator started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    info!("Coordinator shutting down");
                    break;
                }

                message = self.inbound.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        info!("All coordinator handles dropped, shutting down");
                        break;
                    }
                },
            }
        }

        info!(live_tabs = self.registry.len(), "Coordinator stopped");
    }

    fn handle(&mut self, message: CoordinatorMessage) {
        let CoordinatorMessage {
            sender,
            envelope,
            reply,
        } = message;

        let answer = match envelope {
            RelayEnvelope::PageEvent(event) => self.on_page_event(sender, &event),
            RelayEnvelope::QueryTabStatus { tab_id } => {
                Some(RelayEnvelope::TabStatus(self.registry.get(tab_id)))
            }
            RelayEnvelope::ListTabs => Some(RelayEnvelope::Tabs {
                tabs: self.registry.entries(),
            }),
            RelayEnvelope::TabOpened { tab_id } => {
                self.registry.open(tab_id);
                debug!(tab_id = %tab_id, "Tab opened");
                None
            }
            RelayEnvelope::TabClosed { tab_id } => {
                let existed = self.registry.close(tab_id);
                self.indicator
                    .apply(tab_id, &self.style.state_for(Status::Safe));
                info!(tab_id = %tab_id, had_entry = existed, "Tab closed, entry removed");
                None
            }
            other => {
                warn!(kind = other.kind(), "Coordinator ignoring unexpected envelope");
                None
            }
        };

        if let (Some(reply), Some(answer)) = (reply, answer) {
            // The requester may have given up; nothing to do then.
            let _ = reply.send(answer);
        }
    }

    fn on_page_event(&mut self, sender: SenderMeta, event: &PageEvent) -> Option<RelayEnvelope> {
        let Some(tab_id) = sender.tab_id else {
            warn!(status = ?event.status, "Dropping page event without a tab id");
            return Some(RelayEnvelope::PageEventAck { ok: false });
        };

        let Some(record) = self.registry.apply(tab_id, event, now_ms()) else {
            debug!(tab_id = %tab_id, "Dropping page event for closed tab");
            return Some(RelayEnvelope::PageEventAck { ok: false });
        };

        let state = self.style.state_for(record.status);
        debug!(
            tab_id = %tab_id,
            status = ?record.status,
            evidence_len = record.evidence.len(),
            "Page event applied"
        );
        self.indicator.apply(tab_id, &state);

        Some(RelayEnvelope::PageEventAck { ok: true })
    }
}

#[track_caller]
fn closed() -> CaptureError {
    CaptureError::ChannelClosed {
        channel: "coordinator",
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn unexpected(expected: &'static str, actual: &RelayEnvelope) -> CaptureError {
    CaptureError::UnexpectedReply {
        expected,
        actual: actual.kind(),
        location: ErrorLocation::from(Location::caller()),
    }
}

async fn deliver(
    tx: &mpsc::Sender<CoordinatorMessage>,
    sender: SenderMeta,
    envelope: RelayEnvelope,
    reply: Option<oneshot::Sender<RelayEnvelope>>,
) -> CoreResult<()> {
    tx.send(CoordinatorMessage {
        sender,
        envelope,
        reply,
    })
    .await
    .map_err(|_| closed())
}

async fn request(
    tx: &mpsc::Sender<CoordinatorMessage>,
    sender: SenderMeta,
    envelope: RelayEnvelope,
) -> CoreResult<RelayEnvelope> {
    let request_kind = envelope.kind();
    let (reply_tx, reply_rx) = oneshot::channel();
    deliver(tx, sender, envelope, Some(reply_tx)).await?;
    reply_rx.await.map_err(|_| CaptureError::ResponseDropped {
        request: request_kind,
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Consumer- and transport-facing handle to the Coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorMessage>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl CoordinatorHandle {
    /// A link for a page bridge whose messages the transport stamps with `sender`.
    pub fn link(&self, sender: SenderMeta) -> CoordinatorLink {
        CoordinatorLink {
            tx: self.tx.clone(),
            sender,
        }
    }

    /// Cached status of `tab_id` (Safe/empty when unknown).
    #[instrument(skip(self))]
    pub async fn query_tab_status(&self, tab_id: TabId) -> CoreResult<StatusRecord> {
        match request(
            &self.tx,
            SenderMeta::default(),
            RelayEnvelope::QueryTabStatus { tab_id },
        )
        .await?
        {
            RelayEnvelope::TabStatus(record) => Ok(record),
            other => Err(unexpected("TabStatus", &other)),
        }
    }

    /// Every live tab entry.
    #[instrument(skip(self))]
    pub async fn list_tabs(&self) -> CoreResult<Vec<TabEntry>> {
        match request(&self.tx, SenderMeta::default(), RelayEnvelope::ListTabs).await? {
            RelayEnvelope::Tabs { tabs } => Ok(tabs),
            other => Err(unexpected("Tabs", &other)),
        }
    }

    /// Transport lifecycle: `tab_id` starts a new life.
    pub async fn tab_opened(&self, tab_id: TabId) -> CoreResult<()> {
        deliver(
            &self.tx,
            SenderMeta::default(),
            RelayEnvelope::TabOpened { tab_id },
            None,
        )
        .await
    }

    /// Transport lifecycle: `tab_id` went away.
    pub async fn tab_closed(&self, tab_id: TabId) -> CoreResult<()> {
        deliver(
            &self.tx,
            SenderMeta::default(),
            RelayEnvelope::TabClosed { tab_id },
            None,
        )
        .await
    }

    /// Stop the Coordinator.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// A page bridge's connection to the Coordinator.
#[derive(Clone)]
pub struct CoordinatorLink {
    tx: mpsc::Sender<CoordinatorMessage>,
    sender: SenderMeta,
}

impl CoordinatorLink {
    /// Transport metadata stamped on every message from this link.
    pub fn sender(&self) -> SenderMeta {
        self.sender
    }

    /// Fire-and-forget delivery.
    pub async fn forward(&self, envelope: RelayEnvelope) -> CoreResult<()> {
        deliver(&self.tx, self.sender, envelope, None).await
    }

    /// Delivery that waits for the Coordinator's acknowledgement.
    pub async fn forward_acknowledged(&self, envelope: RelayEnvelope) -> CoreResult<bool> {
        match request(&self.tx, self.sender, envelope).await? {
            RelayEnvelope::PageEventAck { ok } => Ok(ok),
            other => Err(unexpected("PageEventAck", &other)),
        }
    }
}
