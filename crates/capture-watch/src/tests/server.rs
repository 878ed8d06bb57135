use crate::{
    server::router,
    tests::{fixture, settle},
};

use capture_watch_core::{TabId, host::sim};

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// WHAT: /api/tabs lists the tabs the Coordinator tracks
/// WHY: External consumers discover tabs through this route
#[tokio::test(start_paused = true)]
async fn given_recording_tab_when_listing_tabs_then_entry_returned() {
    // Given: Tab 31 recording
    let fx = fixture();
    let host = fx
        .sessions
        .lock()
        .await
        .open_tab(TabId(31), sim::full_host())
        .await
        .unwrap();
    let _stream = host.get_user_media(json!({ "audio": true })).await.unwrap();
    settle(10).await;

    // When: Listing tabs
    let response = router(fx.consumer.clone())
        .oneshot(get("/api/tabs"))
        .await
        .unwrap();

    // Then: One camelCase entry for tab 31
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["tabId"], 31);
    assert_eq!(body[0]["status"], "recording");
    assert_eq!(body[0]["evidence"][0]["kind"], "UserMedia");
}

/// WHAT: The status and page-state routes return consumer views
/// WHY: Refresh and ask-page are both reachable over HTTP
#[tokio::test(start_paused = true)]
async fn given_unknown_tab_when_querying_routes_then_views_returned() {
    let fx = fixture();
    let app = router(fx.consumer.clone());

    let status = app.clone().oneshot(get("/api/tabs/5/status")).await.unwrap();
    let page = app.oneshot(get("/api/tabs/5/page-state")).await.unwrap();

    assert_eq!(status.status(), StatusCode::OK);
    let status = json_body(status).await;
    assert_eq!(status["tabId"], 5);
    assert_eq!(status["source"], "cache");
    assert_eq!(status["headline"], "Safe (no page-side capture detected)");

    assert_eq!(page.status(), StatusCode::OK);
    let page = json_body(page).await;
    assert_eq!(page["source"], "page");
    assert_eq!(page["status"], Value::Null);
}

/// WHAT: Malformed tab ids and unknown paths are rejected
/// WHY: Only numeric tab ids address a tab
#[tokio::test(start_paused = true)]
async fn given_bad_paths_when_requesting_then_client_errors() {
    let fx = fixture();
    let app = router(fx.consumer.clone());

    let bad_id = app.clone().oneshot(get("/api/tabs/abc/status")).await.unwrap();
    let unknown = app.oneshot(get("/api/nothing")).await.unwrap();

    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

/// WHAT: Listing tabs after the Coordinator stopped is a server error
/// WHY: A dead Coordinator must not look like an empty tab list
#[tokio::test(start_paused = true)]
async fn given_stopped_coordinator_when_listing_tabs_then_internal_error() {
    let fx = fixture();
    fx.coordinator.shutdown();
    settle(10).await;

    let response = router(fx.consumer.clone())
        .oneshot(get("/api/tabs"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
