use crate::{
    CoreResult, PipelineTiming,
    host::{MediaAcquirer, MediaStream},
    intercept::spawn_watcher,
    status::{CaptureKind, Evidence, SourceLease, StatusEngine},
};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// Wrapper around user/display media acquisition.
pub(crate) struct InterceptedAcquire {
    kind: CaptureKind,
    inner: Arc<dyn MediaAcquirer>,
    engine: Arc<StatusEngine>,
    timing: PipelineTiming,
}

impl InterceptedAcquire {
    pub(crate) fn new(
        kind: CaptureKind,
        inner: Arc<dyn MediaAcquirer>,
        engine: Arc<StatusEngine>,
        timing: PipelineTiming,
    ) -> Self {
        Self {
            kind,
            inner,
            engine,
            timing,
        }
    }

    fn watch_stream(&self, stream: &MediaStream, lease: SourceLease) {
        if stream.tracks().is_empty() {
            // No track will ever fire `ended`.
            self.engine.discard_source(lease);
            return;
        }

        let stream = stream.clone();
        let engine = Arc::clone(&self.engine);
        let debounce = self.timing.safe_debounce;
        let reason = format!("{} tracks ended", self.kind.entry_point());

        spawn_watcher(&self.engine, lease, async move {
            stream.ended().await;
            let generation = engine.generation();
            debug!(stream_id = %stream.id(), "All tracks ended, debouncing Safe");
            tokio::time::sleep(debounce).await;
            engine.release_source(lease, generation, reason);
        });
    }
}

#[async_trait]
impl MediaAcquirer for InterceptedAcquire {
    #[instrument(skip(self, constraints), fields(kind = ?self.kind))]
    async fn acquire(&self, constraints: Value) -> CoreResult<MediaStream> {
        self.engine.record(Evidence::new(
            self.kind,
            json!({ "constraints": constraints.clone() }),
        ));
        let lease = self.engine.acquire_source();

        let result = self.inner.acquire(constraints).await;

        match &result {
            Ok(stream) => self.watch_stream(stream, lease),
            Err(e) => {
                debug!(error = %e, "Acquisition rejected, source dropped");
                self.engine.discard_source(lease);
            }
        }

        result
    }
}
