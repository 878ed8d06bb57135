use crate::status::{StatusChange, StatusSnapshot};

use std::fmt;

use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of in-flight page messages before slow readers lag.
pub const PAGE_CHANNEL_CAPACITY: usize = 256;

/// Identity of the script context that posted a page message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub Uuid);

impl ContextId {
    /// A fresh random context id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a page message.
#[derive(Debug, Clone, PartialEq)]
pub enum PageMessageBody {
    /// A Status Engine transition.
    StatusEvent(StatusChange),
    /// Ask the page's engine for its live state.
    StateRequest {
        /// Pairs the answer with this request.
        correlation_id: Uuid,
    },
    /// The engine's answer to a [`PageMessageBody::StateRequest`].
    StateResponse {
        /// Copied from the request.
        correlation_id: Uuid,
        /// Live state.
        state: StatusSnapshot,
    },
}

/// One message on a page channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMessage {
    /// Context that posted it.
    pub origin: ContextId,
    /// Payload.
    pub body: PageMessageBody,
}

/// Messaging channel shared by every script on one page.
///
/// Every subscriber sees every message, including ones posted by unrelated
/// scripts, so readers filter on [`PageMessage::origin`].
#[derive(Debug, Clone)]
pub struct PageChannel {
    tx: broadcast::Sender<PageMessage>,
}

impl PageChannel {
    /// Channel buffering up to `capacity` messages per reader.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Post a message. Returns `false` when nobody is listening.
    pub fn post(&self, message: PageMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Receive every message posted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PageMessage> {
        self.tx.subscribe()
    }
}

impl Default for PageChannel {
    fn default() -> Self {
        Self::new(PAGE_CHANNEL_CAPACITY)
    }
}
