use crate::{relay::TabId, status::Status};

use serde::{Deserialize, Serialize};

/// Default badge text while a tab is recording.
pub const DEFAULT_RECORDING_TEXT: &str = "REC";

/// Default badge background color.
pub const DEFAULT_INDICATOR_COLOR: &str = "#d9534f";

/// What the per-tab indicator should show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndicatorState {
    /// Short badge text, empty when safe.
    pub text: String,
    /// Badge background color.
    pub color: String,
}

/// How statuses map onto indicator states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorStyle {
    /// Text shown while recording.
    pub recording_text: String,
    /// Badge color.
    pub color: String,
}

impl Default for IndicatorStyle {
    fn default() -> Self {
        Self {
            recording_text: DEFAULT_RECORDING_TEXT.to_string(),
            color: DEFAULT_INDICATOR_COLOR.to_string(),
        }
    }
}

impl IndicatorStyle {
    /// Indicator state for `status`.
    pub fn state_for(&self, status: Status) -> IndicatorState {
        let text = match status {
            Status::Recording => self.recording_text.clone(),
            Status::Safe => String::new(),
        };
        IndicatorState {
            text,
            color: self.color.clone(),
        }
    }
}

/// External per-tab indicator driven by the Coordinator (e.g. a toolbar badge).
pub trait Indicator: Send + Sync {
    /// Show `state` for `tab_id`.
    fn apply(&self, tab_id: TabId, state: &IndicatorState);
}
