use crate::{
    CoreResult, PipelineTiming,
    host::{MediaRecorder, MediaStream, RecorderApi, RecorderState},
    intercept::spawn_watcher,
    status::{CaptureKind, Evidence, SourceLease, StatusEngine},
};

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, instrument};

const STOP_REASON: &str = "MediaRecorder stopped & tracks ended";
const IDLE_REASON: &str = "MediaRecorder idle & tracks ended";

/// Wrapper around the media recorder constructor.
///
/// Construction, not `start()`, counts as evidence. The recorder's lease ends
/// when it stops, or when its stream ends while it is not recording.
pub(crate) struct InterceptedRecorderApi {
    inner: Arc<dyn RecorderApi>,
    engine: Arc<StatusEngine>,
    timing: PipelineTiming,
}

impl InterceptedRecorderApi {
    pub(crate) fn new(
        inner: Arc<dyn RecorderApi>,
        engine: Arc<StatusEngine>,
        timing: PipelineTiming,
    ) -> Self {
        Self {
            inner,
            engine,
            timing,
        }
    }

    fn watch_recorder(
        &self,
        recorder: &MediaRecorder,
        stream: Option<MediaStream>,
        lease: SourceLease,
    ) {
        // Receivers only: the watcher must not keep the recorder alive.
        let mut stops = recorder.subscribe_stop();
        let states = recorder.subscribe_state();
        let recorder_id = recorder.id();
        let engine = Arc::clone(&self.engine);
        let settle = self.timing.recorder_settle;

        spawn_watcher(&self.engine, lease, async move {
            let mut stream_ended = false;

            loop {
                let reason = tokio::select! {
                    stopped = stops.recv() => {
                        if !stopped {
                            break;
                        }
                        STOP_REASON
                    }
                    () = tracks_ended(stream.as_ref()), if !stream_ended => {
                        stream_ended = true;
                        if *states.borrow() != RecorderState::Inactive {
                            debug!(%recorder_id, "Recorded stream ended, waiting for the recorder to stop");
                            continue;
                        }
                        IDLE_REASON
                    }
                };

                let generation = engine.generation();
                tokio::time::sleep(settle).await;

                let stream_done = stream.as_ref().is_none_or(MediaStream::all_tracks_ended);
                if stream_done || *states.borrow() == RecorderState::Inactive {
                    engine.release_source(lease, generation, reason);
                    return;
                }

                debug!(%recorder_id, "Recorder restarted before settle, still watching");
            }

            debug!(%recorder_id, "Recorder dropped, source discarded");
            engine.discard_source(lease);
        });
    }
}

/// Resolves once every track of `stream` has ended. Never resolves without a
/// stream.
async fn tracks_ended(stream: Option<&MediaStream>) {
    match stream {
        Some(stream) => stream.ended().await,
        None => std::future::pending().await,
    }
}

impl RecorderApi for InterceptedRecorderApi {
    #[instrument(skip(self, stream, options))]
    fn construct(&self, stream: Option<MediaStream>, options: Value) -> CoreResult<MediaRecorder> {
        let stream_type = stream
            .as_ref()
            .map_or_else(|| "no-stream".to_string(), MediaStream::describe);

        self.engine.record(Evidence::new(
            CaptureKind::RecorderCreated,
            json!({ "options": options.clone(), "streamType": stream_type }),
        ));
        let lease = self.engine.acquire_source();

        let result = self.inner.construct(stream.clone(), options);

        match &result {
            Ok(recorder) => self.watch_recorder(recorder, stream, lease),
            Err(e) => {
                debug!(error = %e, "Recorder construction failed, source dropped");
                self.engine.discard_source(lease);
            }
        }

        result
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.inner.is_type_supported(mime_type)
    }
}
