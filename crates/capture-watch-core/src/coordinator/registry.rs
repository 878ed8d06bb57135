use crate::{
    relay::{PageEvent, StatusRecord, TabEntry, TabId},
    status::{ChangeDetail, Status},
};

use std::collections::{HashMap, VecDeque};

/// Most recently closed tab ids kept under embargo.
pub const CLOSED_TAB_LIMIT: usize = 256;

/// Per-tab status cache, derived only from page events.
///
/// Closed tab ids are embargoed: events for them are refused until the id
/// starts a new life through [`TabRegistry::open`]. Only the last
/// [`CLOSED_TAB_LIMIT`] closed ids are remembered.
#[derive(Debug, Default)]
pub struct TabRegistry {
    entries: HashMap<TabId, StatusRecord>,
    closed: VecDeque<TabId>,
}

impl TabRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a page event for `tab_id`. Returns the updated record, or `None`
    /// when the tab is closed.
    pub fn apply(
        &mut self,
        tab_id: TabId,
        event: &PageEvent,
        received_at_ms: i64,
    ) -> Option<&StatusRecord> {
        if self.closed.contains(&tab_id) {
            return None;
        }

        let record = self.entries.entry(tab_id).or_default();
        match event.status {
            Status::Recording => {
                record.status = Status::Recording;
                if let Some(ChangeDetail::Evidence(evidence)) = &event.detail {
                    record.evidence.push(evidence.clone());
                }
            }
            Status::Safe => {
                record.status = Status::Safe;
                record.evidence.clear();
            }
        }
        record.last_updated_ms = Some(event.timestamp_ms.unwrap_or(received_at_ms));

        Some(record)
    }

    /// Cached record for `tab_id`, or the Safe/empty default.
    pub fn get(&self, tab_id: TabId) -> StatusRecord {
        self.entries.get(&tab_id).cloned().unwrap_or_default()
    }

    /// Start a new life for `tab_id`, discarding anything left from the old one.
    pub fn open(&mut self, tab_id: TabId) {
        self.closed.retain(|closed| *closed != tab_id);
        self.entries.remove(&tab_id);
    }

    /// Forget `tab_id` and refuse further events for it. Returns whether an entry existed.
    pub fn close(&mut self, tab_id: TabId) -> bool {
        if !self.closed.contains(&tab_id) {
            if self.closed.len() == CLOSED_TAB_LIMIT {
                self.closed.pop_front();
            }
            self.closed.push_back(tab_id);
        }
        self.entries.remove(&tab_id).is_some()
    }

    /// Whether `tab_id` is embargoed.
    pub fn is_closed(&self, tab_id: TabId) -> bool {
        self.closed.contains(&tab_id)
    }

    /// Every live entry, ordered by tab id.
    pub fn entries(&self) -> Vec<TabEntry> {
        let mut tabs: Vec<TabEntry> = self
            .entries
            .iter()
            .map(|(tab_id, record)| TabEntry {
                tab_id: *tab_id,
                record: record.clone(),
            })
            .collect();
        tabs.sort_by_key(|entry| entry.tab_id);
        tabs
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
