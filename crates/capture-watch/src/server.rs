//! HTTP surface of the query consumer.
//!
//! - `GET /api/tabs`: every tab the Coordinator tracks
//! - `GET /api/tabs/{tab_id}/status`: cached refresh
//! - `GET /api/tabs/{tab_id}/page-state`: live ask-page

use crate::{AppError, AppResult, ConsumerView, QueryConsumer};

use capture_watch_core::{TabEntry, TabId};

use std::{net::SocketAddr, panic::Location};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use error_location::ErrorLocation;
use tokio::{net::TcpListener, sync::watch};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, instrument};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Routes of the query server.
pub fn router(consumer: QueryConsumer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/tabs", get(list_tabs))
        .route("/api/tabs/{tab_id}/status", get(tab_status))
        .route("/api/tabs/{tab_id}/page-state", get(page_state))
        .layer(cors)
        .with_state(consumer)
}

/// Serve `router` on `listener` until `shutdown_rx` flips to `true`.
#[instrument(skip_all)]
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> AppResult<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Query server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| AppError::ServerError {
            reason: format!("Query server stopped: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Query server stopped");

    Ok(())
}

/// Bind the query server address.
pub async fn bind(addr: SocketAddr) -> AppResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::ServerError {
            reason: format!("Failed to bind {}: {}", addr, e),
            location: ErrorLocation::from(Location::caller()),
        })
}

async fn list_tabs(State(consumer): State<QueryConsumer>) -> AppResult<Json<Vec<TabEntry>>> {
    Ok(Json(consumer.list().await?))
}

async fn tab_status(
    State(consumer): State<QueryConsumer>,
    Path(tab_id): Path<u32>,
) -> Json<ConsumerView> {
    Json(consumer.refresh(TabId(tab_id)).await)
}

async fn page_state(
    State(consumer): State<QueryConsumer>,
    Path(tab_id): Path<u32>,
) -> Json<ConsumerView> {
    Json(consumer.ask_page(TabId(tab_id)).await)
}
