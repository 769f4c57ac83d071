//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes (zones, viewport, live control)
//! - Request validation
//! - Response formatting
//! - `/ws` hub endpoint

mod live_routes;
mod routes;
mod zone_routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: uptime.num_seconds().max(0) as u64,
        live_state: state.live.state().as_str().to_string(),
        ws_clients: state.realtime.connection_count(),
    };

    Json(response)
}
