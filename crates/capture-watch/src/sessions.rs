//! Live monitored tabs.
//!
//! Each tab owns a page context (the intercepted host plus its Status Engine)
//! and a context bridge linked to the Coordinator under the tab's id.

use crate::AppResult;

use capture_watch_core::{
    BridgeHandle, ContextBridge, CoordinatorHandle, PageContext, PipelineTiming, SenderMeta,
    TabId, host::HostEnvironment,
};

use std::collections::HashMap;

use tokio::task::JoinHandle;
use tracing::{info, instrument};

struct TabSession {
    page: PageContext,
    bridge: BridgeHandle,
    bridge_task: JoinHandle<()>,
}

/// Every open tab, keyed by tab id.
pub struct TabSessions {
    coordinator: CoordinatorHandle,
    timing: PipelineTiming,
    tabs: HashMap<TabId, TabSession>,
}

impl TabSessions {
    /// No tabs open yet.
    pub fn new(coordinator: CoordinatorHandle, timing: PipelineTiming) -> Self {
        Self {
            coordinator,
            timing,
            tabs: HashMap::new(),
        }
    }

    /// Open `tab_id` over `host` and return the intercepted host its page
    /// scripts use. A tab already open under that id is closed first.
    #[instrument(skip(self, host))]
    pub async fn open_tab(
        &mut self,
        tab_id: TabId,
        host: HostEnvironment,
    ) -> AppResult<HostEnvironment> {
        if self.tabs.contains_key(&tab_id) {
            self.close_tab(tab_id).await?;
        }

        self.coordinator.tab_opened(tab_id).await?;

        let page = PageContext::attach(host, self.timing);
        let link = self.coordinator.link(SenderMeta::tab(tab_id));
        let (bridge, bridge_task) = ContextBridge::attach(&page, link, self.timing);
        let page_host = page.host().clone();

        self.tabs.insert(
            tab_id,
            TabSession {
                page,
                bridge,
                bridge_task,
            },
        );

        info!(tab_id = %tab_id, open_tabs = self.tabs.len(), "Tab opened");

        Ok(page_host)
    }

    /// Close `tab_id`. Returns whether it was open.
    #[instrument(skip(self))]
    pub async fn close_tab(&mut self, tab_id: TabId) -> AppResult<bool> {
        let Some(session) = self.tabs.remove(&tab_id) else {
            return Ok(false);
        };

        session.bridge_task.abort();
        drop(session.page);
        self.coordinator.tab_closed(tab_id).await?;

        info!(tab_id = %tab_id, open_tabs = self.tabs.len(), "Tab closed");

        Ok(true)
    }

    /// Close every tab.
    pub async fn close_all(&mut self) -> AppResult<()> {
        for tab_id in self.tab_ids() {
            self.close_tab(tab_id).await?;
        }
        Ok(())
    }

    /// Bridge handle of `tab_id`, for direct page-state queries.
    pub fn bridge(&self, tab_id: TabId) -> Option<BridgeHandle> {
        self.tabs.get(&tab_id).map(|session| session.bridge.clone())
    }

    /// Open tab ids, ascending.
    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.tabs.keys().copied().collect();
        ids.sort();
        ids
    }
}
