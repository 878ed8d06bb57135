//! The isolated-context relay attached to each page.
//!
//! Forwards every Status Engine transition seen on the page channel to the
//! Coordinator, and serves direct page-state queries with correlated,
//! time-limited request/response exchanges over the same channel.

mod context_bridge;

pub use context_bridge::{BridgeCommand, BridgeHandle, ContextBridge};
