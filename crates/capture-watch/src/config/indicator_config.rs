use crate::config::{default_indicator_color, default_recording_text};

use capture_watch_core::IndicatorStyle;
use serde::{Deserialize, Serialize};

/// Per-tab badge appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Badge text while a tab is recording.
    #[serde(default = "default_recording_text")]
    pub recording_text: String,

    /// Badge background color, `#rrggbb`.
    #[serde(default = "default_indicator_color")]
    pub color: String,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            recording_text: default_recording_text(),
            color: default_indicator_color(),
        }
    }
}

impl IndicatorConfig {
    /// Style handed to the Coordinator.
    pub fn style(&self) -> IndicatorStyle {
        IndicatorStyle {
            recording_text: self.recording_text.clone(),
            color: self.color.clone(),
        }
    }
}
