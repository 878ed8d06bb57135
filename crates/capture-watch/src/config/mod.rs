#[allow(clippy::module_inception)]
mod config;
mod coordinator_config;
mod demo_config;
mod indicator_config;
mod server_config;
mod timing_config;

pub(crate) use {
    config::Config, coordinator_config::CoordinatorConfig, demo_config::DemoConfig,
    indicator_config::IndicatorConfig, server_config::ServerConfig, timing_config::TimingConfig,
};

use std::time::Duration;

use capture_watch_core::{
    DEFAULT_PAGE_QUERY_TIMEOUT, DEFAULT_RECORDER_SETTLE, DEFAULT_SAFE_DEBOUNCE,
    coordinator::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_INDICATOR_COLOR, DEFAULT_RECORDING_TEXT},
};

pub(crate) const DEFAULT_PORT: u16 = 7878;
pub(crate) const DEFAULT_DEMO_ENABLED: bool = true;
pub(crate) const DEFAULT_DEMO_STEP_DELAY_MS: u64 = 750;
pub(crate) const DEFAULT_DEMO_EXIT_WHEN_DONE: bool = false;

// Durations are stored as whole milliseconds in the file.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn default_safe_debounce_ms() -> u64 {
    whole_millis(DEFAULT_SAFE_DEBOUNCE)
}

pub(crate) fn default_recorder_settle_ms() -> u64 {
    whole_millis(DEFAULT_RECORDER_SETTLE)
}

pub(crate) fn default_page_query_timeout_ms() -> u64 {
    whole_millis(DEFAULT_PAGE_QUERY_TIMEOUT)
}

pub(crate) fn default_recording_text() -> String {
    DEFAULT_RECORDING_TEXT.to_string()
}

pub(crate) fn default_indicator_color() -> String {
    DEFAULT_INDICATOR_COLOR.to_string()
}

pub(crate) fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn default_demo_enabled() -> bool {
    DEFAULT_DEMO_ENABLED
}

pub(crate) fn default_demo_step_delay_ms() -> u64 {
    DEFAULT_DEMO_STEP_DELAY_MS
}

pub(crate) fn default_demo_exit_when_done() -> bool {
    DEFAULT_DEMO_EXIT_WHEN_DONE
}
