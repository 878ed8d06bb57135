//! Status readout for one tab: a cached refresh from the Coordinator, or a
//! live ask-page through the tab's bridge.

use crate::{AppResult, TabSessions};

use capture_watch_core::{
    CoordinatorHandle, Evidence, PageStateReply, Status, StatusRecord, TabEntry, TabId,
};

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

const RECORDING_HEADLINE: &str = "Recording detected";
const SAFE_HEADLINE: &str = "Safe (no page-side capture detected)";
const NO_DATA_HEADLINE: &str = "No data";
const NO_BRIDGE_DETAILS: &str = "No response (no bridge attached to this tab)";
const NO_RESPONSE_DETAILS: &str = "No response";
const FAILED_DETAILS: &str = "Failed to get state";

/// Where a [`ConsumerView`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewSource {
    /// Coordinator cache.
    Cache,
    /// The page's own Status Engine.
    Page,
}

/// What the consumer shows for one tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerView {
    /// Tab the view describes.
    pub tab_id: TabId,
    /// Where the state came from.
    pub source: ViewSource,
    /// Status, when one could be read.
    pub status: Option<Status>,
    /// One-line summary.
    pub headline: String,
    /// Evidence as pretty JSON, or the failure detail.
    pub details: String,
}

impl ConsumerView {
    fn from_status(
        tab_id: TabId,
        source: ViewSource,
        status: Status,
        evidence: &[Evidence],
    ) -> Self {
        let (headline, details) = match status {
            Status::Recording => (
                RECORDING_HEADLINE,
                serde_json::to_string_pretty(evidence).unwrap_or_default(),
            ),
            Status::Safe => (SAFE_HEADLINE, String::new()),
        };

        Self {
            tab_id,
            source,
            status: Some(status),
            headline: headline.to_string(),
            details,
        }
    }

    fn unavailable(tab_id: TabId, source: ViewSource, details: impl Into<String>) -> Self {
        Self {
            tab_id,
            source,
            status: None,
            headline: NO_DATA_HEADLINE.to_string(),
            details: details.into(),
        }
    }

    /// Cached record rendered as a refresh result.
    pub fn from_record(tab_id: TabId, record: &StatusRecord) -> Self {
        Self::from_status(tab_id, ViewSource::Cache, record.status, &record.evidence)
    }

    /// Direct page reply rendered as an ask-page result.
    pub fn from_page_reply(tab_id: TabId, reply: &PageStateReply) -> Self {
        match (&reply.state, reply.ok) {
            (Some(state), true) => {
                Self::from_status(tab_id, ViewSource::Page, state.status, &state.evidence)
            }
            _ => {
                let mut view = Self::unavailable(tab_id, ViewSource::Page, FAILED_DETAILS);
                if let Some(reason) = &reply.reason {
                    view.details = format!("{}: {}", FAILED_DETAILS, reason);
                }
                view
            }
        }
    }

    /// Headline and details as they would be printed.
    pub fn render(&self) -> String {
        if self.details.is_empty() {
            self.headline.clone()
        } else {
            format!("{}\n{}", self.headline, self.details)
        }
    }
}

/// Reads tab status for people and the HTTP surface.
#[derive(Clone)]
pub struct QueryConsumer {
    coordinator: CoordinatorHandle,
    sessions: Arc<Mutex<TabSessions>>,
}

impl QueryConsumer {
    /// Consumer over the Coordinator and the open tabs.
    pub fn new(coordinator: CoordinatorHandle, sessions: Arc<Mutex<TabSessions>>) -> Self {
        Self {
            coordinator,
            sessions,
        }
    }

    /// Refresh: the Coordinator's cached state for `tab_id`.
    #[instrument(skip(self))]
    pub async fn refresh(&self, tab_id: TabId) -> ConsumerView {
        match self.coordinator.query_tab_status(tab_id).await {
            Ok(record) => ConsumerView::from_record(tab_id, &record),
            Err(e) => {
                warn!(tab_id = %tab_id, error = %e, "Coordinator query failed");
                ConsumerView::unavailable(tab_id, ViewSource::Cache, String::new())
            }
        }
    }

    /// Ask-page: the live state of `tab_id`, bypassing the cache.
    #[instrument(skip(self))]
    pub async fn ask_page(&self, tab_id: TabId) -> ConsumerView {
        // Release the sessions lock before waiting on the page.
        let bridge = self.sessions.lock().await.bridge(tab_id);
        let Some(bridge) = bridge else {
            return ConsumerView::unavailable(tab_id, ViewSource::Page, NO_BRIDGE_DETAILS);
        };

        match bridge.request_page_state().await {
            Ok(reply) => ConsumerView::from_page_reply(tab_id, &reply),
            Err(e) => {
                warn!(tab_id = %tab_id, error = %e, "Page state request failed");
                ConsumerView::unavailable(tab_id, ViewSource::Page, NO_RESPONSE_DETAILS)
            }
        }
    }

    /// Every tab the Coordinator is tracking.
    pub async fn list(&self) -> AppResult<Vec<TabEntry>> {
        Ok(self.coordinator.list_tabs().await?)
    }
}
