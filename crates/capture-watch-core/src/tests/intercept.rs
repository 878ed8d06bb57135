use crate::{
    CaptureError, CoreResult,
    host::{
        HostEnvironment, MediaAcquirer, MediaElement, MediaStream, MediaTrack, PeerConnection,
        RecorderApi, TrackKind,
        sim::{self, SimMediaDevices, SimSource},
    },
    intercept,
    status::{CaptureKind, ChangeDetail, Status},
    tests::support::{collect_changes, settle, timing},
};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

/// Acquirer that always hands back the same stream.
struct FixedAcquirer {
    stream: MediaStream,
}

#[async_trait]
impl MediaAcquirer for FixedAcquirer {
    async fn acquire(&self, _constraints: serde_json::Value) -> CoreResult<MediaStream> {
        Ok(self.stream.clone())
    }
}

/// WHAT: A camera stream drives Recording, then Safe once its tracks end
/// WHY: This is the basic detection loop for getUserMedia
#[tokio::test(start_paused = true)]
async fn given_user_media_when_tracks_end_then_safe_after_debounce() {
    // Given: An intercepted host
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let changes = collect_changes(&engine);

    // When: The page acquires a camera stream
    let stream = host
        .get_user_media(json!({ "video": true }))
        .await
        .expect("camera granted");

    // Then: Recording with one UserMedia evidence carrying the constraints
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, Status::Recording);
    assert_eq!(snapshot.evidence.len(), 1);
    assert_eq!(snapshot.evidence[0].kind, CaptureKind::UserMedia);
    assert_eq!(
        snapshot.evidence[0].metadata,
        json!({ "constraints": { "video": true } })
    );

    // When: All tracks stop
    stream.stop();
    settle(50).await;

    // Then: Still Recording inside the debounce window
    assert!(engine.is_recording());

    // When: The debounce elapses
    settle(100).await;

    // Then: Safe with the tracks-ended reason
    assert_eq!(engine.snapshot().status, Status::Safe);
    assert!(engine.snapshot().evidence.is_empty());
    let changes = changes.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(changes.len(), 2);
    assert_eq!(
        changes[1].detail,
        ChangeDetail::Reason("getUserMedia tracks ended".to_string())
    );
}

/// WHAT: Two overlapping streams keep Recording until both have ended
/// WHY: Ending one capture must not hide another
#[tokio::test(start_paused = true)]
async fn given_two_streams_when_first_stops_then_still_recording() {
    // Given: Two acquisitions
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let first = host
        .get_user_media(json!({ "audio": true }))
        .await
        .expect("mic granted");
    let second = host
        .get_user_media(json!({ "video": true }))
        .await
        .expect("camera granted");
    assert_eq!(engine.snapshot().evidence.len(), 2);

    // When: The first stream ends
    first.stop();
    settle(300).await;

    // Then: Still Recording, evidence untouched
    assert!(engine.is_recording());
    assert_eq!(engine.snapshot().evidence.len(), 2);

    // When: The second stream ends
    second.stop();
    settle(300).await;

    // Then: Safe
    assert_eq!(engine.snapshot().status, Status::Safe);
}

/// WHAT: Stopping the screen stream before the recorder does not go Safe
/// WHY: A recorder still draining its stream is still capture
#[tokio::test(start_paused = true)]
async fn given_display_and_recorder_when_display_ends_first_then_no_safe_until_recorder_stops() {
    // Given: A screen stream being recorded
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let changes = collect_changes(&engine);
    let screen = host
        .get_display_media(json!({ "video": true }))
        .await
        .expect("screen granted");
    let recorder = host
        .new_recorder(Some(screen.clone()), json!({ "mimeType": "video/webm" }))
        .expect("recorder created");
    recorder.start();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.evidence.len(), 2);
    assert_eq!(snapshot.evidence[1].kind, CaptureKind::RecorderCreated);
    assert_eq!(
        snapshot.evidence[1].metadata,
        json!({ "options": { "mimeType": "video/webm" }, "streamType": "video" })
    );

    // When: The screen tracks end while the recorder is still active
    screen.stop();
    settle(300).await;

    // Then: No Safe transition yet
    assert!(engine.is_recording());
    assert!(
        changes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .all(|c| c.status == Status::Recording)
    );

    // When: The recorder stops
    recorder.stop();
    settle(100).await;

    // Then: Exactly one Safe, from the recorder
    let changes = changes.lock().unwrap_or_else(|e| e.into_inner());
    let safes: Vec<_> = changes
        .iter()
        .filter(|c| c.status == Status::Safe)
        .collect();
    assert_eq!(safes.len(), 1);
    assert_eq!(
        safes[0].detail,
        ChangeDetail::Reason("MediaRecorder stopped & tracks ended".to_string())
    );
}

/// WHAT: A recorder restarted within the settle window keeps the page Recording
/// WHY: stop() followed by start() is a pause, not the end of capture
#[tokio::test(start_paused = true)]
async fn given_recorder_restarted_within_settle_then_still_recording() {
    // Given: A recorder over a live camera stream
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let stream = host
        .get_user_media(json!({ "video": true }))
        .await
        .expect("camera granted");
    let recorder = host
        .new_recorder(Some(stream.clone()), json!({}))
        .expect("recorder created");
    recorder.start();

    // When: It is stopped and immediately restarted
    recorder.stop();
    recorder.start();
    settle(200).await;

    // Then: Still Recording with both sources live
    assert!(engine.is_recording());
    assert_eq!(engine.active_sources(), 2);

    // When: The recorder stops for good and the stream ends
    recorder.stop();
    stream.stop();
    settle(200).await;

    // Then: Safe
    assert_eq!(engine.snapshot().status, Status::Safe);
}

/// WHAT: A recorder without a stream goes Safe once stopped
/// WHY: With no stream there are no tracks left to wait for
#[tokio::test(start_paused = true)]
async fn given_streamless_recorder_when_stopped_then_safe() {
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());

    let recorder = host.new_recorder(None, json!({})).expect("recorder created");
    assert_eq!(
        engine.snapshot().evidence[0].metadata["streamType"],
        json!("no-stream")
    );

    recorder.start();
    recorder.stop();
    settle(100).await;

    assert_eq!(engine.snapshot().status, Status::Safe);
}

/// WHAT: A recorder that was built but never started does not pin the page to Recording
/// WHY: Once the camera tracks end there is nothing left to record
#[tokio::test(start_paused = true)]
async fn given_unstarted_recorder_when_tracks_end_then_safe() {
    // Given: A camera stream with an idle recorder over it
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let stream = host
        .get_user_media(json!({ "video": true }))
        .await
        .expect("camera granted");
    let _recorder = host
        .new_recorder(Some(stream.clone()), json!({}))
        .expect("recorder created");
    assert_eq!(engine.active_sources(), 2);

    // When: The camera tracks end
    stream.stop();
    settle(500).await;

    // Then: Safe, with no source left holding the page
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, Status::Safe);
    assert!(snapshot.evidence.is_empty());
    assert_eq!(engine.active_sources(), 0);
}

/// WHAT: Dropping a recorder releases its source without a transition
/// WHY: A recorder the page threw away can never fire stop
#[tokio::test(start_paused = true)]
async fn given_recorder_dropped_then_source_discarded_and_still_recording() {
    // Given: A live camera stream and a recorder over it
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let stream = host
        .get_user_media(json!({ "video": true }))
        .await
        .expect("camera granted");
    let recorder = host
        .new_recorder(Some(stream.clone()), json!({}))
        .expect("recorder created");

    // When: The page drops the recorder
    drop(recorder);
    settle(100).await;

    // Then: Only the camera source remains and the page is still Recording
    assert_eq!(engine.active_sources(), 1);
    assert!(engine.is_recording());

    // When: The camera tracks end
    stream.stop();
    settle(500).await;

    // Then: Safe
    assert_eq!(engine.snapshot().status, Status::Safe);
}

/// WHAT: Evidence arriving during the debounce window cancels the stale Safe
/// WHY: A late Safe must never erase newer capture evidence
#[tokio::test(start_paused = true)]
async fn given_new_evidence_during_debounce_when_timer_fires_then_stays_recording() {
    // Given: A stream that just ended
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let stream = host
        .get_user_media(json!({ "audio": true }))
        .await
        .expect("mic granted");
    stream.stop();
    settle(40).await;

    // When: A canvas is captured before the debounce fires
    host.capture_stream(&MediaElement::new("CANVAS"), Some(30.0))
        .expect("canvas captured");
    settle(200).await;

    // Then: Recording with both pieces of evidence
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, Status::Recording);
    assert_eq!(snapshot.evidence.len(), 2);
}

/// WHAT: Element capture is evidence only and never schedules Safe
/// WHY: There is no end signal to observe for captured element streams
#[tokio::test(start_paused = true)]
async fn given_capture_stream_when_called_then_element_descriptor_recorded() {
    // Given: An intercepted host and a styled video element
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let element = MediaElement {
        tag_name: "VIDEO".to_string(),
        id: Some("player".to_string()),
        class_name: Some("main wide".to_string()),
    };

    // When: Capturing the element and stopping the resulting stream
    let stream = host
        .capture_stream(&element, None)
        .expect("element captured");
    assert_eq!(stream.describe(), "video,audio");
    stream.stop();
    settle(500).await;

    // Then: Recording with the element descriptor
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, Status::Recording);
    assert_eq!(snapshot.evidence[0].kind, CaptureKind::CaptureStream);
    assert_eq!(
        snapshot.evidence[0].metadata,
        json!({ "element": "VIDEO#player.main.wide" })
    );
}

/// WHAT: addTrack records the track kind and stream count
/// WHY: Publishing a track to a peer is outbound capture
#[tokio::test(start_paused = true)]
async fn given_peer_connection_when_track_added_then_evidence_recorded() {
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let track = MediaTrack::new(TrackKind::Audio);
    let stream = MediaStream::new(vec![track.clone()]);

    let sender = host
        .add_track(&PeerConnection::new(), &track, &[stream])
        .expect("track added");

    assert!(sender.track.ptr_eq(&track));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.evidence[0].kind, CaptureKind::PeerConnectionAddTrack);
    assert_eq!(
        snapshot.evidence[0].metadata,
        json!({ "trackKind": "audio", "streamsInfo": 1 })
    );
}

/// WHAT: The wrapper hands back exactly the object the host produced
/// WHY: Page scripts must not be able to tell they are being observed
#[tokio::test(start_paused = true)]
async fn given_fixed_acquirer_when_intercepted_then_same_stream_returned() {
    let original = MediaStream::new(vec![MediaTrack::new(TrackKind::Video)]);
    let mut host = HostEnvironment {
        user_media: Some(Arc::new(FixedAcquirer {
            stream: original.clone(),
        })),
        ..HostEnvironment::default()
    };
    intercept::install(&mut host, timing());

    let returned = host
        .get_user_media(json!({ "video": true }))
        .await
        .expect("stream returned");

    assert!(returned.ptr_eq(&original));
}

/// WHAT: A rejected acquisition passes the host error through and holds no source
/// WHY: Denied permission must look identical to an unobserved page
#[tokio::test(start_paused = true)]
async fn given_denied_permission_when_acquiring_then_error_passes_through() {
    // Given: A host that denies the camera
    let mut host = HostEnvironment {
        user_media: Some(Arc::new(
            SimMediaDevices::new(SimSource::User).denying("NotAllowedError"),
        )),
        ..HostEnvironment::default()
    };
    let engine = intercept::install(&mut host, timing());

    // When: The page asks for the camera
    let result = host.get_user_media(json!({ "video": true })).await;

    // Then: Same rejection, the attempt counted, no live source
    match result {
        Err(CaptureError::HostCapability { reason, .. }) => {
            assert_eq!(reason, "NotAllowedError");
        }
        other => panic!("expected host rejection, got {:?}", other.map(|s| s.id())),
    }
    assert!(engine.is_recording());
    assert_eq!(engine.active_sources(), 0);
}

/// WHAT: An unsupported recorder type fails construction without a live source
/// WHY: The failing constructor call is still an attempt, but nothing will stop
#[tokio::test(start_paused = true)]
async fn given_unsupported_mime_when_constructing_recorder_then_error_and_no_source() {
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());

    let result = host.new_recorder(None, json!({ "mimeType": "video/mp4" }));

    assert!(result.is_err());
    assert_eq!(engine.snapshot().evidence.len(), 1);
    assert_eq!(engine.active_sources(), 0);
}

/// WHAT: Static recorder members keep working and are not evidence
/// WHY: Feature detection is not capture
#[tokio::test(start_paused = true)]
async fn given_intercepted_recorder_when_checking_type_support_then_forwarded() {
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());
    let Some(recorder) = host.recorder.as_ref() else {
        panic!("recorder slot should stay present");
    };

    assert!(recorder.is_type_supported("video/webm;codecs=vp9"));
    assert!(!recorder.is_type_supported("video/mp4"));
    assert_eq!(engine.snapshot().status, Status::Safe);
}

/// WHAT: Missing capabilities are skipped and stay missing
/// WHY: Installation must never fail because a host lacks an API
#[tokio::test(start_paused = true)]
async fn given_partial_host_when_installing_then_absent_slots_skipped() {
    // Given: A host with only user media
    let mut host = HostEnvironment {
        user_media: Some(Arc::new(SimMediaDevices::new(SimSource::User))),
        ..HostEnvironment::default()
    };

    // When: Installing interception
    let engine = intercept::install(&mut host, timing());

    // Then: Only user media is present and calls to the rest fail as before
    assert!(host.user_media.is_some());
    assert!(host.display_media.is_none());
    assert!(host.recorder.is_none());
    assert!(host.capture_stream.is_none());
    assert!(host.peer_connection.is_none());
    assert!(host.get_display_media(json!({})).await.is_err());
    assert_eq!(engine.snapshot().status, Status::Safe);
}

/// WHAT: Installing twice reuses the first engine and wraps only once
/// WHY: A second wrap would double-count every call
#[tokio::test(start_paused = true)]
async fn given_installed_host_when_installing_again_then_same_engine() {
    let mut host = sim::full_host();
    let first = intercept::install(&mut host, timing());
    let second = intercept::install(&mut host, timing());

    assert!(Arc::ptr_eq(&first, &second));

    let _stream = host
        .get_user_media(json!({ "audio": true }))
        .await
        .expect("mic granted");
    assert_eq!(first.snapshot().evidence.len(), 1);
}

/// WHAT: Without an async runtime the stream is not watched
/// WHY: The call must still succeed and report Recording
#[test]
fn given_no_runtime_when_acquiring_then_recording_without_watcher() {
    let mut host = sim::full_host();
    let engine = intercept::install(&mut host, timing());

    let stream = futures::executor::block_on(host.get_user_media(json!({ "video": true })))
        .expect("camera granted");

    assert_eq!(stream.tracks().len(), 1);
    assert!(engine.is_recording());
    assert_eq!(engine.active_sources(), 0);
}
