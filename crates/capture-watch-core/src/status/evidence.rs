use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Milliseconds since the Unix epoch, wall clock.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Coarse capture status of one page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No capture evidence outstanding.
    #[default]
    Safe,
    /// At least one capture-capable API has been invoked.
    Recording,
}

/// Which capture-capable entry point produced a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Microphone/camera acquisition.
    UserMedia,
    /// Screen/window/tab acquisition.
    DisplayMedia,
    /// A media recorder was constructed.
    RecorderCreated,
    /// A media element's stream was captured.
    CaptureStream,
    /// A track was added to an outgoing peer connection.
    PeerConnectionAddTrack,
}

impl CaptureKind {
    /// Host-facing name of the intercepted entry point, used in log lines and Safe reasons.
    pub fn entry_point(self) -> &'static str {
        match self {
            CaptureKind::UserMedia => "getUserMedia",
            CaptureKind::DisplayMedia => "getDisplayMedia",
            CaptureKind::RecorderCreated => "MediaRecorder",
            CaptureKind::CaptureStream => "captureStream",
            CaptureKind::PeerConnectionAddTrack => "RTCPeerConnection.addTrack",
        }
    }
}

/// One intercepted capability invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Entry point that was invoked.
    pub kind: CaptureKind,
    /// Free-form call details (constraints, track kind, element descriptor...).
    pub metadata: Value,
    /// When the invocation was observed.
    pub observed_at_ms: i64,
}

impl Evidence {
    /// Evidence observed now.
    pub fn new(kind: CaptureKind, metadata: Value) -> Self {
        Self {
            kind,
            metadata,
            observed_at_ms: now_ms(),
        }
    }
}

/// Point-in-time copy of a Status Engine's state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Current status.
    pub status: Status,
    /// Evidence accumulated since the last Safe transition, in invocation order.
    pub evidence: Vec<Evidence>,
}

/// What triggered a status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeDetail {
    /// A new piece of evidence (Recording transitions).
    Evidence(Evidence),
    /// Why the page went Safe.
    Reason(String),
}

/// Notification delivered to Status Engine listeners on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// Status after the transition.
    pub status: Status,
    /// The evidence or reason behind it.
    pub detail: ChangeDetail,
    /// When the transition happened.
    pub timestamp_ms: i64,
}
