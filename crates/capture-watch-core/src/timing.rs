use std::time::Duration;

/// Delay between the last track ending and the Safe request.
///
/// Absorbs near-simultaneous `ended` events of audio+video tracks so the
/// page does not flicker through intermediate states.
pub const DEFAULT_SAFE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Delay between a recorder's stop notification and its end-of-life check.
pub const DEFAULT_RECORDER_SETTLE: Duration = Duration::from_millis(50);

/// How long a direct page-state query waits for the page to answer.
pub const DEFAULT_PAGE_QUERY_TIMEOUT: Duration = Duration::from_millis(2000);

/// Timing parameters shared by the interception layer and the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTiming {
    /// See [`DEFAULT_SAFE_DEBOUNCE`].
    pub safe_debounce: Duration,
    /// See [`DEFAULT_RECORDER_SETTLE`].
    pub recorder_settle: Duration,
    /// See [`DEFAULT_PAGE_QUERY_TIMEOUT`].
    pub page_query_timeout: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            safe_debounce: DEFAULT_SAFE_DEBOUNCE,
            recorder_settle: DEFAULT_RECORDER_SETTLE,
            page_query_timeout: DEFAULT_PAGE_QUERY_TIMEOUT,
        }
    }
}
