use crate::status::{ChangeDetail, Evidence, Status, StatusSnapshot};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Browser tab identifier as assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata the transport attaches to every message it delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SenderMeta {
    /// Tab the sending context lives in, when the sender is a tab.
    pub tab_id: Option<TabId>,
}

impl SenderMeta {
    /// Sender living in `tab_id`.
    pub fn tab(tab_id: TabId) -> Self {
        Self {
            tab_id: Some(tab_id),
        }
    }
}

/// Status change forwarded from a page to the Coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEvent {
    /// Always unset by the bridge; the Coordinator resolves the tab from [`SenderMeta`].
    pub tab_id_hint: Option<TabId>,
    /// Status after the page's transition.
    pub status: Status,
    /// Evidence or reason behind it.
    pub detail: Option<ChangeDetail>,
    /// When the bridge relayed the event.
    pub timestamp_ms: Option<i64>,
}

/// Coordinator's cached status for one tab.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Cached status.
    pub status: Status,
    /// Cached evidence.
    pub evidence: Vec<Evidence>,
    /// Timestamp of the event that last touched this record.
    pub last_updated_ms: Option<i64>,
}

/// A live registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabEntry {
    /// Tab the record belongs to.
    pub tab_id: TabId,
    /// The record.
    #[serde(flatten)]
    pub record: StatusRecord,
}

/// Outcome of a direct page-state query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStateReply {
    /// Whether the page answered.
    pub ok: bool,
    /// Live state, when `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StatusSnapshot>,
    /// Why the query failed, when not `ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PageStateReply {
    /// The page answered with `state`.
    pub fn answered(state: StatusSnapshot) -> Self {
        Self {
            ok: true,
            state: Some(state),
            reason: None,
        }
    }

    /// The page did not answer.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            state: None,
            reason: Some(reason.into()),
        }
    }
}

/// Every message exchanged between bridge, Coordinator and consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum RelayEnvelope {
    /// Bridge → Coordinator, fire-and-forget.
    PageEvent(PageEvent),
    /// Coordinator → bridge, optional acknowledgement of a page event.
    PageEventAck {
        /// Whether the event was applied.
        ok: bool,
    },
    /// Consumer → Coordinator.
    QueryTabStatus {
        /// Tab to look up.
        tab_id: TabId,
    },
    /// Coordinator → consumer, answer to [`RelayEnvelope::QueryTabStatus`].
    TabStatus(StatusRecord),
    /// Consumer → Coordinator, every live entry.
    ListTabs,
    /// Coordinator → consumer, answer to [`RelayEnvelope::ListTabs`].
    Tabs {
        /// Live entries, ordered by tab id.
        tabs: Vec<TabEntry>,
    },
    /// Consumer → bridge → page.
    RequestPageState {
        /// Pairs the page's answer with this request.
        correlation_id: Option<Uuid>,
    },
    /// Page → bridge → consumer.
    PageState {
        /// Copied from the request.
        correlation_id: Option<Uuid>,
        /// The answer.
        reply: PageStateReply,
    },
    /// Transport → Coordinator, a tab id starts a new life.
    TabOpened {
        /// Tab that opened.
        tab_id: TabId,
    },
    /// Transport → Coordinator, a tab went away.
    TabClosed {
        /// Tab that closed.
        tab_id: TabId,
    },
}

impl RelayEnvelope {
    /// Correlation id of request/response kinds.
    pub fn correlation_id(&self) -> Option<Uuid> {
        match self {
            RelayEnvelope::RequestPageState { correlation_id }
            | RelayEnvelope::PageState { correlation_id, .. } => *correlation_id,
            _ => None,
        }
    }

    /// Discriminant name, as serialized in `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEnvelope::PageEvent(_) => "PageEvent",
            RelayEnvelope::PageEventAck { .. } => "PageEventAck",
            RelayEnvelope::QueryTabStatus { .. } => "QueryTabStatus",
            RelayEnvelope::TabStatus(_) => "TabStatus",
            RelayEnvelope::ListTabs => "ListTabs",
            RelayEnvelope::Tabs { .. } => "Tabs",
            RelayEnvelope::RequestPageState { .. } => "RequestPageState",
            RelayEnvelope::PageState { .. } => "PageState",
            RelayEnvelope::TabOpened { .. } => "TabOpened",
            RelayEnvelope::TabClosed { .. } => "TabClosed",
        }
    }
}
