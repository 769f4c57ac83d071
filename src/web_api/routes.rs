//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use futures::{SinkExt, StreamExt};

use super::{live_routes, zone_routes};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Zones
        .route(
            "/api/zones",
            get(zone_routes::list_zones).post(zone_routes::create_zone),
        )
        .route("/api/zones/active", put(zone_routes::set_active_zone))
        .route("/api/zones/drawing-kind", put(zone_routes::set_drawing_kind))
        .route(
            "/api/zones/definitions",
            get(zone_routes::export_definitions).put(zone_routes::import_definitions),
        )
        .route("/api/zones/export", get(zone_routes::export_zones))
        .route("/api/zones/:id", delete(zone_routes::delete_zone))
        .route("/api/zones/:id/label", put(zone_routes::rename_zone))
        .route("/api/zones/:id/classes", put(zone_routes::set_class_filter))
        .route("/api/zones/:id/kind", put(zone_routes::set_kind))
        .route("/api/zones/:id/points", post(zone_routes::add_point))
        .route(
            "/api/zones/:id/points/last",
            delete(zone_routes::remove_last_point),
        )
        // Viewport
        .route(
            "/api/viewport",
            get(zone_routes::get_viewport).put(zone_routes::update_viewport),
        )
        .route("/api/viewport/pointer", post(zone_routes::apply_pointer))
        // Live
        .route("/api/live/start", post(live_routes::start_live))
        .route("/api/live/stop", post(live_routes::stop_live))
        .route("/api/live/restart", post(live_routes::restart_live))
        .route("/api/live/state", get(live_routes::get_live_state))
        .route("/api/live/frame.jpg", get(live_routes::get_latest_frame))
        .route(
            "/api/live/thresholds/:zone_id",
            put(live_routes::set_threshold),
        )
        .route("/api/live/alerts", get(live_routes::list_alerts))
        // WebSocket
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

// ========================================
// WebSocket Handler
// ========================================

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Register with RealtimeHub
    let (conn_id, mut rx) = state.realtime.register().await;

    // Spawn task to forward messages from hub to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Clients only listen; incoming frames just keep the connection alive
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Ping(data)) => {
                    // Pong is handled automatically by axum
                    tracing::trace!("Received ping: {:?}", data);
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    // Unregister from hub
    state.realtime.unregister(&conn_id).await;
}
