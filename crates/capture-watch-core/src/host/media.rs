use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Kind of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Microphone or tab/system audio.
    Audio,
    /// Camera or screen video.
    Video,
}

impl TrackKind {
    /// Lowercase name as reported by the host.
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

/// Lifecycle of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Producing media.
    Live,
    /// Permanently stopped.
    Ended,
}

#[derive(Debug)]
struct TrackInner {
    id: Uuid,
    kind: TrackKind,
    state: watch::Sender<ReadyState>,
}

/// A live media track. Clones share the same underlying track.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    /// A new live track.
    pub fn new(kind: TrackKind) -> Self {
        let (state, _) = watch::channel(ReadyState::Live);
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4(),
                kind,
                state,
            }),
        }
    }

    /// Track identifier.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Media kind.
    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    /// Current lifecycle state.
    pub fn ready_state(&self) -> ReadyState {
        *self.inner.state.borrow()
    }

    /// Stop the track. Idempotent.
    pub fn stop(&self) {
        self.inner.state.send_replace(ReadyState::Ended);
    }

    /// Resolves once the track has ended (immediately if it already has).
    pub async fn ended(&self) {
        let mut rx = self.inner.state.subscribe();
        let _ = rx.wait_for(|state| *state == ReadyState::Ended).await;
    }

    /// Whether both handles refer to the same track.
    pub fn ptr_eq(&self, other: &MediaTrack) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[derive(Debug)]
struct StreamInner {
    id: Uuid,
    tracks: Vec<MediaTrack>,
}

/// A set of tracks produced by one capture call.
#[derive(Debug, Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

impl MediaStream {
    /// A stream over the given tracks.
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id: Uuid::new_v4(),
                tracks,
            }),
        }
    }

    /// Stream identifier.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Tracks of this stream.
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.inner.tracks
    }

    /// True when every track has ended (vacuously true for an empty stream).
    pub fn all_tracks_ended(&self) -> bool {
        self.inner
            .tracks
            .iter()
            .all(|t| t.ready_state() == ReadyState::Ended)
    }

    /// Resolves once every track has ended.
    pub async fn ended(&self) {
        join_all(self.inner.tracks.iter().map(MediaTrack::ended)).await;
    }

    /// Stop every track.
    pub fn stop(&self) {
        for track in &self.inner.tracks {
            track.stop();
        }
    }

    /// Comma-joined track kinds, e.g. `"audio,video"`.
    pub fn describe(&self) -> String {
        self.inner
            .tracks
            .iter()
            .map(|t| t.kind().as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &MediaStream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Recorder lifecycle as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Not recording (initial, and after stop).
    Inactive,
    /// Recording.
    Recording,
    /// Recording paused.
    Paused,
}

#[derive(Debug)]
struct RecorderInner {
    id: Uuid,
    stream: Option<MediaStream>,
    mime_type: Option<String>,
    state: watch::Sender<RecorderState>,
    stops: watch::Sender<u64>,
}

/// A media recorder handle. Clones share the same recorder.
#[derive(Debug, Clone)]
pub struct MediaRecorder {
    inner: Arc<RecorderInner>,
}

impl MediaRecorder {
    /// A new inactive recorder over `stream`.
    pub fn new(stream: Option<MediaStream>, mime_type: Option<String>) -> Self {
        let (state, _) = watch::channel(RecorderState::Inactive);
        let (stops, _) = watch::channel(0);
        Self {
            inner: Arc::new(RecorderInner {
                id: Uuid::new_v4(),
                stream,
                mime_type,
                state,
                stops,
            }),
        }
    }

    /// Recorder identifier.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Stream being recorded, if any.
    pub fn stream(&self) -> Option<&MediaStream> {
        self.inner.stream.as_ref()
    }

    /// Requested container type.
    pub fn mime_type(&self) -> Option<&str> {
        self.inner.mime_type.as_deref()
    }

    /// Current recorder state.
    pub fn state(&self) -> RecorderState {
        *self.inner.state.borrow()
    }

    /// Begin recording.
    pub fn start(&self) {
        self.inner.state.send_replace(RecorderState::Recording);
    }

    /// Pause an active recording.
    pub fn pause(&self) {
        self.inner.state.send_if_modified(|state| {
            if *state == RecorderState::Recording {
                *state = RecorderState::Paused;
                true
            } else {
                false
            }
        });
    }

    /// Stop recording and fire the stop notification.
    pub fn stop(&self) {
        self.inner.state.send_replace(RecorderState::Inactive);
        self.inner.stops.send_modify(|count| *count += 1);
    }

    /// Watch the recorder state. Closes once every handle is dropped.
    pub fn subscribe_state(&self) -> watch::Receiver<RecorderState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to stop notifications fired after this call.
    pub fn subscribe_stop(&self) -> RecorderStopSignal {
        RecorderStopSignal {
            rx: self.inner.stops.subscribe(),
        }
    }

    /// Whether both handles refer to the same recorder.
    pub fn ptr_eq(&self, other: &MediaRecorder) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Receiver side of a recorder's stop notification.
#[derive(Debug)]
pub struct RecorderStopSignal {
    rx: watch::Receiver<u64>,
}

impl RecorderStopSignal {
    /// Wait for the next stop. Returns `false` once the recorder is gone.
    pub async fn recv(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// A playable media element (audio/video/canvas) as seen by page scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaElement {
    /// Upper-case tag name, e.g. `VIDEO`.
    pub tag_name: String,
    /// Element id attribute.
    pub id: Option<String>,
    /// Space-separated class attribute.
    pub class_name: Option<String>,
}

impl MediaElement {
    /// Element with the given tag and no id or classes.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            id: None,
            class_name: None,
        }
    }

    /// `TAG#id.class1.class2`, id and classes omitted when empty.
    pub fn describe(&self) -> String {
        let mut out = self.tag_name.clone();
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            out.push('#');
            out.push_str(id);
        }
        if let Some(classes) = self.class_name.as_deref() {
            for class in classes.split_whitespace() {
                out.push('.');
                out.push_str(class);
            }
        }
        out
    }
}

/// A peer connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerConnection {
    /// Connection identifier.
    pub id: Uuid,
}

impl PeerConnection {
    /// A fresh connection handle.
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for PeerConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Sender created by adding a track to a peer connection.
#[derive(Debug, Clone)]
pub struct RtpSender {
    /// Sender identifier.
    pub id: Uuid,
    /// Connection the sender belongs to.
    pub connection: PeerConnection,
    /// Outgoing track.
    pub track: MediaTrack,
}
