//! Per-page status state machine.
//!
//! Safe is the initial state. Any evidence moves the page to Recording and is
//! appended (never deduplicated). Only a go-safe signal returns it to Safe,
//! which clears the evidence list.
//!
//! Delayed Safe requests from capture sources go through source leases: a
//! lease is taken when a capture source starts and released once its
//! end-of-life check passes. The release only turns into a Safe transition
//! when it was the last active lease and no evidence arrived after the
//! end-of-life signal was observed.

use crate::status::{ChangeDetail, Evidence, Status, StatusChange, StatusSnapshot, now_ms};

use std::{
    collections::HashSet,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, info, warn};

/// Callback invoked synchronously on every transition.
///
/// Listeners must not call back into transition methods of the same engine.
pub type StatusListener = Arc<dyn Fn(&StatusChange) + Send + Sync + 'static>;

/// Wrap a closure as a [`StatusListener`].
pub fn new_listener<F>(f: F) -> StatusListener
where
    F: Fn(&StatusChange) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle to an active capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLease(u64);

#[derive(Debug, Default)]
struct EngineState {
    status: Status,
    evidence: Vec<Evidence>,
    generation: u64,
    active_sources: HashSet<SourceLease>,
    next_lease: u64,
}

/// Authoritative status of one page context.
#[derive(Default)]
pub struct StatusEngine {
    state: Mutex<EngineState>,
    listeners: Mutex<Vec<StatusListener>>,
    // Held across update + notify so listeners observe transitions in order.
    notify: Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl StatusEngine {
    /// Create an engine in the Safe state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for all future transitions.
    pub fn subscribe(&self, listener: StatusListener) {
        lock(&self.listeners).push(listener);
    }

    /// Snapshot of the current status and evidence.
    pub fn snapshot(&self) -> StatusSnapshot {
        let state = lock(&self.state);
        StatusSnapshot {
            status: state.status,
            evidence: state.evidence.clone(),
        }
    }

    /// Whether the page is currently Recording.
    pub fn is_recording(&self) -> bool {
        lock(&self.state).status == Status::Recording
    }

    /// Number of evidence records received so far. Advances on every piece of evidence.
    pub fn generation(&self) -> u64 {
        lock(&self.state).generation
    }

    /// Number of capture sources still considered live.
    pub fn active_sources(&self) -> usize {
        lock(&self.state).active_sources.len()
    }

    /// Append evidence and move to (or stay in) Recording.
    pub fn record(&self, evidence: Evidence) {
        let _order = lock(&self.notify);
        let change = {
            let mut state = lock(&self.state);
            state.status = Status::Recording;
            state.evidence.push(evidence.clone());
            state.generation += 1;

            debug!(
                kind = ?evidence.kind,
                evidence_len = state.evidence.len(),
                "Evidence recorded"
            );

            StatusChange {
                status: Status::Recording,
                detail: ChangeDetail::Evidence(evidence),
                timestamp_ms: now_ms(),
            }
        };
        self.notify_listeners(&change);
    }

    /// Unconditional go-safe signal: clears evidence and every source lease.
    pub fn set_safe(&self, reason: impl Into<String>) {
        let _order = lock(&self.notify);
        let change = {
            let mut state = lock(&self.state);
            Self::clear(&mut state);
            Self::safe_change(reason.into())
        };
        self.notify_listeners(&change);
    }

    /// Register a new live capture source.
    pub fn acquire_source(&self) -> SourceLease {
        let mut state = lock(&self.state);
        let lease = SourceLease(state.next_lease);
        state.next_lease += 1;
        state.active_sources.insert(lease);
        lease
    }

    /// Drop a lease whose source never went live. Never transitions.
    pub fn discard_source(&self, lease: SourceLease) {
        lock(&self.state).active_sources.remove(&lease);
    }

    /// Release a lease after its source's end-of-life check passed.
    ///
    /// `observed_generation` is [`generation`](Self::generation) sampled when
    /// the end-of-life signal arrived. Returns `true` if this release moved
    /// the page to Safe.
    pub fn release_source(
        &self,
        lease: SourceLease,
        observed_generation: u64,
        reason: impl Into<String>,
    ) -> bool {
        let reason = reason.into();
        let _order = lock(&self.notify);
        let change = {
            let mut state = lock(&self.state);
            if !state.active_sources.remove(&lease) {
                debug!(?lease, "Lease already released");
                return false;
            }
            if !state.active_sources.is_empty() {
                debug!(
                    remaining = state.active_sources.len(),
                    reason = %reason,
                    "Capture sources still active, staying Recording"
                );
                return false;
            }
            if state.generation != observed_generation {
                debug!(
                    observed_generation,
                    generation = state.generation,
                    reason = %reason,
                    "Evidence arrived during debounce, ignoring stale Safe"
                );
                return false;
            }
            if state.status == Status::Safe {
                return false;
            }
            Self::clear(&mut state);
            Self::safe_change(reason)
        };
        self.notify_listeners(&change);
        true
    }

    fn clear(state: &mut EngineState) {
        state.status = Status::Safe;
        state.evidence.clear();
        state.active_sources.clear();
    }

    fn safe_change(reason: String) -> StatusChange {
        info!(reason = %reason, "Page is safe");
        StatusChange {
            status: Status::Safe,
            detail: ChangeDetail::Reason(reason),
            timestamp_ms: now_ms(),
        }
    }

    fn notify_listeners(&self, change: &StatusChange) {
        let listeners = lock(&self.listeners).clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(change))).is_err() {
                warn!(status = ?change.status, "Status listener panicked, discarded");
            }
        }
    }
}
