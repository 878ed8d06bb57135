//! In-memory host used by tests and the demo session.
//!
//! Streams get one track per requested kind. Acquisition can be delayed or
//! made to fail, and every produced object is a real host handle whose
//! lifecycle is driven by calling `stop()` on it.

use crate::{
    CaptureError, CoreResult,
    host::{
        CaptureStreamApi, HostEnvironment, MediaAcquirer, MediaElement, MediaRecorder,
        MediaStream, MediaTrack, PeerConnection, PeerConnectionApi, RecorderApi, RtpSender,
        TrackKind,
    },
};

use std::{panic::Location, sync::Arc, time::Duration};

use async_trait::async_trait;
use error_location::ErrorLocation;
use serde_json::Value;
use uuid::Uuid;

fn wants(constraints: &Value, key: &str) -> bool {
    match constraints.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Which acquisition entry point a [`SimMediaDevices`] models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimSource {
    /// Camera/microphone: tracks follow the `audio`/`video` constraints.
    User,
    /// Screen: always a video track, plus audio when requested.
    Display,
}

/// Simulated user/display media acquisition.
#[derive(Debug, Clone)]
pub struct SimMediaDevices {
    source: SimSource,
    latency: Duration,
    deny_reason: Option<String>,
}

impl SimMediaDevices {
    /// Devices that grant every request immediately.
    pub fn new(source: SimSource) -> Self {
        Self {
            source,
            latency: Duration::ZERO,
            deny_reason: None,
        }
    }

    /// Resolve requests only after `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reject every request with `reason` (e.g. `NotAllowedError`).
    pub fn denying(mut self, reason: impl Into<String>) -> Self {
        self.deny_reason = Some(reason.into());
        self
    }
}

#[async_trait]
impl MediaAcquirer for SimMediaDevices {
    async fn acquire(&self, constraints: Value) -> CoreResult<MediaStream> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(reason) = &self.deny_reason {
            return Err(CaptureError::HostCapability {
                reason: reason.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut tracks = Vec::new();
        if wants(&constraints, "audio") {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        if self.source == SimSource::Display || wants(&constraints, "video") {
            tracks.push(MediaTrack::new(TrackKind::Video));
        }

        if tracks.is_empty() {
            return Err(CaptureError::HostCapability {
                reason: "TypeError: at least one of audio and video must be requested".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(MediaStream::new(tracks))
    }
}

/// Simulated media recorder constructor.
#[derive(Debug, Clone)]
pub struct SimRecorderApi {
    supported_types: Vec<String>,
}

impl Default for SimRecorderApi {
    fn default() -> Self {
        Self {
            supported_types: vec!["video/webm".to_string(), "audio/webm".to_string()],
        }
    }
}

impl RecorderApi for SimRecorderApi {
    fn construct(&self, stream: Option<MediaStream>, options: Value) -> CoreResult<MediaRecorder> {
        let mime_type = options
            .get("mimeType")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(mime) = mime_type.as_deref().filter(|m| !self.is_type_supported(m)) {
            return Err(CaptureError::HostCapability {
                reason: format!("NotSupportedError: {} is not supported", mime),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(MediaRecorder::new(stream, mime_type))
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported_types
            .iter()
            .any(|t| mime_type.starts_with(t.as_str()))
    }
}

/// Simulated element capture: one video track, plus audio for media elements.
#[derive(Debug, Clone, Default)]
pub struct SimCaptureStream;

impl CaptureStreamApi for SimCaptureStream {
    fn capture_stream(
        &self,
        element: &MediaElement,
        _frame_rate: Option<f64>,
    ) -> CoreResult<MediaStream> {
        let mut tracks = vec![MediaTrack::new(TrackKind::Video)];
        if !element.tag_name.eq_ignore_ascii_case("CANVAS") {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        Ok(MediaStream::new(tracks))
    }
}

/// Simulated peer connection.
#[derive(Debug, Clone, Default)]
pub struct SimPeerConnection;

impl PeerConnectionApi for SimPeerConnection {
    fn add_track(
        &self,
        connection: &PeerConnection,
        track: &MediaTrack,
        _streams: &[MediaStream],
    ) -> CoreResult<RtpSender> {
        Ok(RtpSender {
            id: Uuid::new_v4(),
            connection: *connection,
            track: track.clone(),
        })
    }
}

/// A host exposing all five capabilities.
pub fn full_host() -> HostEnvironment {
    HostEnvironment {
        user_media: Some(Arc::new(SimMediaDevices::new(SimSource::User))),
        display_media: Some(Arc::new(SimMediaDevices::new(SimSource::Display))),
        recorder: Some(Arc::new(SimRecorderApi::default())),
        capture_stream: Some(Arc::new(SimCaptureStream)),
        peer_connection: Some(Arc::new(SimPeerConnection)),
        hook: None,
    }
}
