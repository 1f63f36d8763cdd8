//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// No authentication: broadcasts are public. A malformed upgrade request is
/// rejected by the [`WebSocketUpgrade`] extractor before anything is
/// registered.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = Arc::clone(&state.hub);
    let keepalive = state.keepalive;

    ws.on_failed_upgrade(|e| tracing::debug!(error = %e, "ws upgrade failed"))
        .on_upgrade(move |socket| async move {
            let _reason = run_connection(socket, hub, keepalive).await;
        })
}
