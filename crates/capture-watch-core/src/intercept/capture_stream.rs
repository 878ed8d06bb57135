use crate::{
    CoreResult,
    host::{CaptureStreamApi, MediaElement, MediaStream},
    status::{CaptureKind, Evidence, StatusEngine},
};

use std::sync::Arc;

use serde_json::json;

/// Wrapper around element stream capture. Evidence only; there is no end
/// signal to schedule a Safe transition from.
pub(crate) struct InterceptedCaptureStream {
    inner: Arc<dyn CaptureStreamApi>,
    engine: Arc<StatusEngine>,
}

impl InterceptedCaptureStream {
    pub(crate) fn new(inner: Arc<dyn CaptureStreamApi>, engine: Arc<StatusEngine>) -> Self {
        Self { inner, engine }
    }
}

impl CaptureStreamApi for InterceptedCaptureStream {
    fn capture_stream(
        &self,
        element: &MediaElement,
        frame_rate: Option<f64>,
    ) -> CoreResult<MediaStream> {
        self.engine.record(Evidence::new(
            CaptureKind::CaptureStream,
            json!({ "element": element.describe() }),
        ));
        self.inner.capture_stream(element, frame_rate)
    }
}
