use crate::{
    CoreResult,
    host::{MediaStream, MediaTrack, PeerConnection, PeerConnectionApi, RtpSender},
    status::{CaptureKind, Evidence, StatusEngine},
};

use std::sync::Arc;

use serde_json::json;

/// Wrapper around `addTrack` on peer connections. Evidence only.
pub(crate) struct InterceptedPeerConnection {
    inner: Arc<dyn PeerConnectionApi>,
    engine: Arc<StatusEngine>,
}

impl InterceptedPeerConnection {
    pub(crate) fn new(inner: Arc<dyn PeerConnectionApi>, engine: Arc<StatusEngine>) -> Self {
        Self { inner, engine }
    }
}

impl PeerConnectionApi for InterceptedPeerConnection {
    fn add_track(
        &self,
        connection: &PeerConnection,
        track: &MediaTrack,
        streams: &[MediaStream],
    ) -> CoreResult<RtpSender> {
        self.engine.record(Evidence::new(
            CaptureKind::PeerConnectionAddTrack,
            json!({ "trackKind": track.kind(), "streamsInfo": streams.len() }),
        ));
        self.inner.add_track(connection, track, streams)
    }
}
