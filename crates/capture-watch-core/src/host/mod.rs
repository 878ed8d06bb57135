//! Host environment model: the capture-capable capabilities a page can reach.
//!
//! Each capability is an optional trait object. `None` means the host does
//! not provide it (older engine, insecure context, ...).

mod media;
pub mod sim;

pub use media::{
    MediaElement, MediaRecorder, MediaStream, MediaTrack, PeerConnection, ReadyState,
    RecorderState, RecorderStopSignal, RtpSender, TrackKind,
};

use crate::{CaptureError, CoreResult, status::StatusEngine};

use std::{panic::Location, sync::Arc};

use async_trait::async_trait;
use error_location::ErrorLocation;
use serde_json::Value;

/// Asynchronous stream acquisition (user media, display media).
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    /// Request a stream matching `constraints`.
    async fn acquire(&self, constraints: Value) -> CoreResult<MediaStream>;
}

/// Media recorder constructor and its static members.
pub trait RecorderApi: Send + Sync {
    /// Construct a recorder over `stream`.
    fn construct(&self, stream: Option<MediaStream>, options: Value) -> CoreResult<MediaRecorder>;

    /// Whether the host can record into `mime_type`.
    fn is_type_supported(&self, mime_type: &str) -> bool;
}

/// Stream capture from a playable media element.
pub trait CaptureStreamApi: Send + Sync {
    /// Capture the element's output as a stream.
    fn capture_stream(
        &self,
        element: &MediaElement,
        frame_rate: Option<f64>,
    ) -> CoreResult<MediaStream>;
}

/// Outgoing-track side of a peer connection.
pub trait PeerConnectionApi: Send + Sync {
    /// Add `track` to `connection`, associated with `streams`.
    fn add_track(
        &self,
        connection: &PeerConnection,
        track: &MediaTrack,
        streams: &[MediaStream],
    ) -> CoreResult<RtpSender>;
}

/// The capabilities visible to one page context.
#[derive(Clone, Default)]
pub struct HostEnvironment {
    /// Microphone/camera acquisition.
    pub user_media: Option<Arc<dyn MediaAcquirer>>,
    /// Screen acquisition.
    pub display_media: Option<Arc<dyn MediaAcquirer>>,
    /// Media recorder constructor.
    pub recorder: Option<Arc<dyn RecorderApi>>,
    /// Element stream capture.
    pub capture_stream: Option<Arc<dyn CaptureStreamApi>>,
    /// Peer connection track publishing.
    pub peer_connection: Option<Arc<dyn PeerConnectionApi>>,
    pub(crate) hook: Option<Arc<StatusEngine>>,
}

#[track_caller]
fn unavailable(name: &str) -> CaptureError {
    CaptureError::HostCapability {
        reason: format!("{} is not available", name),
        location: ErrorLocation::from(Location::caller()),
    }
}

impl HostEnvironment {
    /// Status Engine installed into this host, if interception is active.
    pub fn status_engine(&self) -> Option<&Arc<StatusEngine>> {
        self.hook.as_ref()
    }

    /// Page-script view of `navigator.mediaDevices.getUserMedia`.
    pub async fn get_user_media(&self, constraints: Value) -> CoreResult<MediaStream> {
        let api = self
            .user_media
            .as_ref()
            .ok_or_else(|| unavailable("getUserMedia"))?;
        api.acquire(constraints).await
    }

    /// Page-script view of `navigator.mediaDevices.getDisplayMedia`.
    pub async fn get_display_media(&self, constraints: Value) -> CoreResult<MediaStream> {
        let api = self
            .display_media
            .as_ref()
            .ok_or_else(|| unavailable("getDisplayMedia"))?;
        api.acquire(constraints).await
    }

    /// Page-script view of `new MediaRecorder(stream, options)`.
    #[track_caller]
    pub fn new_recorder(
        &self,
        stream: Option<MediaStream>,
        options: Value,
    ) -> CoreResult<MediaRecorder> {
        let api = self
            .recorder
            .as_ref()
            .ok_or_else(|| unavailable("MediaRecorder"))?;
        api.construct(stream, options)
    }

    /// Page-script view of `element.captureStream(frameRate)`.
    #[track_caller]
    pub fn capture_stream(
        &self,
        element: &MediaElement,
        frame_rate: Option<f64>,
    ) -> CoreResult<MediaStream> {
        let api = self
            .capture_stream
            .as_ref()
            .ok_or_else(|| unavailable("captureStream"))?;
        api.capture_stream(element, frame_rate)
    }

    /// Page-script view of `connection.addTrack(track, ...streams)`.
    #[track_caller]
    pub fn add_track(
        &self,
        connection: &PeerConnection,
        track: &MediaTrack,
        streams: &[MediaStream],
    ) -> CoreResult<RtpSender> {
        let api = self
            .peer_connection
            .as_ref()
            .ok_or_else(|| unavailable("RTCPeerConnection.addTrack"))?;
        api.add_track(connection, track, streams)
    }
}
