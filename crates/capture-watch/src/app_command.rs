use capture_watch_core::TabId;

/// Commands sent to the main application loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// The tab went away: tear down its page and tell the Coordinator.
    CloseTab {
        /// Tab to close.
        tab_id: TabId,
    },
    /// Request application shutdown.
    Shutdown,
}
