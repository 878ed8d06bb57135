use crate::tests::{fixture, settle};

use capture_watch_core::{Status, StatusRecord, TabId, host::sim};

use serde_json::json;

/// WHAT: Capture through an opened tab's host reaches the Coordinator under that tab
/// WHY: The session wires page, bridge and sender metadata together
#[tokio::test(start_paused = true)]
async fn given_opened_tab_when_page_captures_then_coordinator_tracks_tab() {
    // Given: Tab 11 opened over a simulated host
    let fx = fixture();
    let host = fx
        .sessions
        .lock()
        .await
        .open_tab(TabId(11), sim::full_host())
        .await
        .unwrap();

    // When: The page acquires the microphone
    let stream = host.get_user_media(json!({ "audio": true })).await.unwrap();
    settle(10).await;

    // Then: Recording for tab 11 and the badge shows REC
    let record = fx.coordinator.query_tab_status(TabId(11)).await.unwrap();
    assert_eq!(record.status, Status::Recording);
    assert_eq!(fx.badges.badge(TabId(11)).map(|b| b.text), Some("REC".to_string()));

    // When: The microphone is released
    stream.stop();
    settle(200).await;

    // Then: Safe again
    let record = fx.coordinator.query_tab_status(TabId(11)).await.unwrap();
    assert_eq!(record.status, Status::Safe);
    assert_eq!(fx.badges.badge(TabId(11)), None);
}

/// WHAT: Closing a tab drops its bridge and its cached entry
/// WHY: Closed tabs must read as Safe and be unreachable for ask-page
#[tokio::test(start_paused = true)]
async fn given_recording_tab_when_closed_then_forgotten() {
    // Given: A recording tab
    let fx = fixture();
    let host = fx
        .sessions
        .lock()
        .await
        .open_tab(TabId(12), sim::full_host())
        .await
        .unwrap();
    let _screen = host.get_display_media(json!({})).await.unwrap();
    settle(10).await;

    // When: Closing it twice
    let first = fx.sessions.lock().await.close_tab(TabId(12)).await.unwrap();
    let second = fx.sessions.lock().await.close_tab(TabId(12)).await.unwrap();

    // Then: Only the first close found it, and the tab is gone everywhere
    assert!(first);
    assert!(!second);
    assert!(fx.sessions.lock().await.bridge(TabId(12)).is_none());
    assert!(fx.sessions.lock().await.tab_ids().is_empty());
    assert_eq!(
        fx.coordinator.query_tab_status(TabId(12)).await.unwrap(),
        StatusRecord::default()
    );
}

/// WHAT: Reopening a closed tab id resumes tracking
/// WHY: Browsers reuse tab ids
#[tokio::test(start_paused = true)]
async fn given_closed_tab_when_reopened_then_tracked_again() {
    // Given: Tab 13 opened and closed
    let fx = fixture();
    fx.sessions
        .lock()
        .await
        .open_tab(TabId(13), sim::full_host())
        .await
        .unwrap();
    fx.sessions.lock().await.close_tab(TabId(13)).await.unwrap();

    // When: The id is opened again and the new page captures
    let host = fx
        .sessions
        .lock()
        .await
        .open_tab(TabId(13), sim::full_host())
        .await
        .unwrap();
    let _stream = host.get_user_media(json!({ "video": true })).await.unwrap();
    settle(10).await;

    // Then: The new life is tracked
    let record = fx.coordinator.query_tab_status(TabId(13)).await.unwrap();
    assert_eq!(record.status, Status::Recording);
    assert_eq!(record.evidence.len(), 1);
    assert_eq!(fx.sessions.lock().await.tab_ids(), vec![TabId(13)]);
}
