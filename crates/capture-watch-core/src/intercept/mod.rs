//! Interposition on the host's capture-capable capabilities.
//!
//! Every present capability slot of a [`HostEnvironment`] is replaced by a
//! wrapper implementing the same trait. A wrapper records evidence first, then
//! delegates to the original and hands its result back untouched. Absent
//! capabilities are skipped.

mod acquire;
mod capture_stream;
mod peer_connection;
mod recorder;

pub(crate) use {
    acquire::InterceptedAcquire, capture_stream::InterceptedCaptureStream,
    peer_connection::InterceptedPeerConnection, recorder::InterceptedRecorderApi,
};

use crate::{
    PipelineTiming,
    host::HostEnvironment,
    status::{CaptureKind, SourceLease, StatusEngine},
};

use std::{future::Future, sync::Arc};

use tracing::{debug, info, instrument, warn};

/// Install interception into `host`, returning its Status Engine.
///
/// Idempotent: a host that already carries an engine is returned as-is.
#[instrument(skip(host, timing))]
pub fn install(host: &mut HostEnvironment, timing: PipelineTiming) -> Arc<StatusEngine> {
    if let Some(engine) = &host.hook {
        debug!("Interception already installed");
        return Arc::clone(engine);
    }

    let engine = Arc::new(StatusEngine::new());
    let mut wrapped = Vec::new();

    if let Some(inner) = host.user_media.take() {
        host.user_media = Some(Arc::new(InterceptedAcquire::new(
            CaptureKind::UserMedia,
            inner,
            Arc::clone(&engine),
            timing,
        )));
        wrapped.push(CaptureKind::UserMedia.entry_point());
    }

    if let Some(inner) = host.display_media.take() {
        host.display_media = Some(Arc::new(InterceptedAcquire::new(
            CaptureKind::DisplayMedia,
            inner,
            Arc::clone(&engine),
            timing,
        )));
        wrapped.push(CaptureKind::DisplayMedia.entry_point());
    }

    if let Some(inner) = host.recorder.take() {
        host.recorder = Some(Arc::new(InterceptedRecorderApi::new(
            inner,
            Arc::clone(&engine),
            timing,
        )));
        wrapped.push(CaptureKind::RecorderCreated.entry_point());
    }

    if let Some(inner) = host.capture_stream.take() {
        host.capture_stream = Some(Arc::new(InterceptedCaptureStream::new(
            inner,
            Arc::clone(&engine),
        )));
        wrapped.push(CaptureKind::CaptureStream.entry_point());
    }

    if let Some(inner) = host.peer_connection.take() {
        host.peer_connection = Some(Arc::new(InterceptedPeerConnection::new(
            inner,
            Arc::clone(&engine),
        )));
        wrapped.push(CaptureKind::PeerConnectionAddTrack.entry_point());
    }

    host.hook = Some(Arc::clone(&engine));

    info!(wrapped = ?wrapped, "Interception installed");

    engine
}

/// Run an end-of-life watcher in the background.
///
/// Without a runtime there is nothing to drive the watcher, so the lease is
/// dropped and the page keeps its current status.
pub(crate) fn spawn_watcher<F>(engine: &StatusEngine, lease: SourceLease, watcher: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(watcher);
        }
        Err(_) => {
            warn!("No async runtime, capture source will not be watched");
            engine.discard_source(lease);
        }
    }
}
