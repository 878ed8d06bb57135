//! Capture-watch Core Library
//!
//! Detects whether a page is using audio/video/screen capture and relays
//! that status from the page, through a per-page bridge, into a process-wide
//! Coordinator.
//!
//! # Example
//!
//! ```no_run
//! use capture_watch_core::{
//!     ContextBridge, Coordinator, CoreResult, Indicator, IndicatorState, IndicatorStyle,
//!     PageContext, PipelineTiming, SenderMeta, TabId, host::sim,
//! };
//!
//! use std::sync::Arc;
//!
//! use serde_json::json;
//!
//! struct LogBadge;
//!
//! impl Indicator for LogBadge {
//!     fn apply(&self, tab_id: TabId, state: &IndicatorState) {
//!         println!("tab {}: {:?}", tab_id, state.text);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let timing = PipelineTiming::default();
//!     let (coordinator, _) = Coordinator::spawn(Arc::new(LogBadge), IndicatorStyle::default(), 64);
//!
//!     let page = PageContext::attach(sim::full_host(), timing);
//!     let link = coordinator.link(SenderMeta::tab(TabId(7)));
//!     let (bridge, _) = ContextBridge::attach(&page, link, timing);
//!
//!     let stream = page.host().get_user_media(json!({ "video": true })).await?;
//!
//!     println!("cached: {:?}", coordinator.query_tab_status(TabId(7)).await?.status);
//!     println!("live:   {:?}", bridge.request_page_state().await?);
//!
//!     stream.stop();
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod coordinator;
mod error;
pub mod host;
pub mod intercept;
mod page;
pub mod relay;
pub mod status;
mod timing;

pub use {
    bridge::{BridgeHandle, ContextBridge},
    coordinator::{
        Coordinator, CoordinatorHandle, CoordinatorLink, Indicator, IndicatorState,
        IndicatorStyle,
    },
    error::{CaptureError, Result as CoreResult},
    page::PageContext,
    relay::{PageStateReply, RelayEnvelope, SenderMeta, StatusRecord, TabEntry, TabId},
    status::{CaptureKind, Evidence, Status, StatusEngine, StatusSnapshot},
    timing::{
        DEFAULT_PAGE_QUERY_TIMEOUT, DEFAULT_RECORDER_SETTLE, DEFAULT_SAFE_DEBOUNCE,
        PipelineTiming,
    },
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
