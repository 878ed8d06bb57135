//! Per-tab badge shown while a tab is recording.
//!
//! Holds the badge each tab currently shows and logs every change, standing
//! in for a toolbar icon.

use capture_watch_core::{Indicator, IndicatorState, TabId};

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use tracing::{debug, info};

/// In-memory badge per tab.
#[derive(Debug, Default)]
pub struct BadgeIndicator {
    badges: Mutex<HashMap<TabId, IndicatorState>>,
}

impl BadgeIndicator {
    /// A badge set with nothing shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Badge currently shown for `tab_id`, `None` when cleared.
    pub fn badge(&self, tab_id: TabId) -> Option<IndicatorState> {
        self.lock().get(&tab_id).cloned()
    }

    /// Tooltip-style one-liner for `tab_id`.
    pub fn describe(&self, tab_id: TabId) -> String {
        match self.badge(tab_id) {
            Some(state) => format!("Capture-Watch - tab {} [{}]", tab_id, state.text),
            None => format!("Capture-Watch - tab {} clear", tab_id),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TabId, IndicatorState>> {
        self.badges.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Indicator for BadgeIndicator {
    fn apply(&self, tab_id: TabId, state: &IndicatorState) {
        let mut badges = self.lock();

        let previous = if state.text.is_empty() {
            badges.remove(&tab_id)
        } else {
            badges.insert(tab_id, state.clone())
        };

        let changed = previous.as_ref().map(|p| p.text.as_str()).unwrap_or("") != state.text;
        if changed {
            info!(tab_id = %tab_id, text = %state.text, color = %state.color, "Badge updated");
        } else {
            debug!(tab_id = %tab_id, "Badge unchanged");
        }
    }
}
