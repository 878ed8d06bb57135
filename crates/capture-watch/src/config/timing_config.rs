use crate::config::{
    default_page_query_timeout_ms, default_recorder_settle_ms, default_safe_debounce_ms,
};

use std::time::Duration;

use capture_watch_core::PipelineTiming;
use serde::{Deserialize, Serialize};

/// Pipeline timing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between the last track ending and the Safe transition.
    #[serde(default = "default_safe_debounce_ms")]
    pub safe_debounce_ms: u64,

    /// Delay between a recorder stop and its end-of-life check.
    #[serde(default = "default_recorder_settle_ms")]
    pub recorder_settle_ms: u64,

    /// How long a direct page-state query waits for the page.
    #[serde(default = "default_page_query_timeout_ms")]
    pub page_query_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            safe_debounce_ms: default_safe_debounce_ms(),
            recorder_settle_ms: default_recorder_settle_ms(),
            page_query_timeout_ms: default_page_query_timeout_ms(),
        }
    }
}

impl TimingConfig {
    /// Timing handed to page contexts and bridges.
    pub fn pipeline_timing(&self) -> PipelineTiming {
        PipelineTiming {
            safe_debounce: Duration::from_millis(self.safe_debounce_ms),
            recorder_settle: Duration::from_millis(self.recorder_settle_ms),
            page_query_timeout: Duration::from_millis(self.page_query_timeout_ms),
        }
    }
}
