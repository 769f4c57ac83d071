//! Live API Routes
//!
//! Control surface of the live connection manager, the latest frame and
//! count alert thresholds.

use crate::count_alert_tracker::AlertEvent;
use crate::error::{Error, Result};
use crate::models::{ApiResponse, LiveStateResponse, StartLiveRequest, ThresholdRequest};
use crate::realtime_hub::{CountAlertMessage, HubMessage};
use crate::state::AppState;
use crate::stream_manager::SourceRef;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

fn live_state(state: &AppState) -> Json<ApiResponse<LiveStateResponse>> {
    Json(ApiResponse::success(LiveStateResponse {
        snapshot: state.live.snapshot(),
        running: state.live.is_running(),
    }))
}

/// POST /api/live/start
pub async fn start_live(
    State(state): State<AppState>,
    Json(req): Json<StartLiveRequest>,
) -> Result<impl IntoResponse> {
    let task_id = req.task_id.trim();
    if task_id.is_empty() {
        return Err(Error::Validation("task_id must not be empty".to_string()));
    }

    state.live.start(SourceRef::new(task_id))?;
    tracing::info!(task_id = %task_id, "Live start requested");
    Ok(live_state(&state))
}

/// POST /api/live/stop
pub async fn stop_live(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.live.stop()?;
    tracing::info!("Live stop requested");
    Ok(live_state(&state))
}

/// POST /api/live/restart
pub async fn restart_live(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.live.restart()?;
    tracing::info!("Live restart requested");
    Ok(live_state(&state))
}

/// GET /api/live/state
pub async fn get_live_state(State(state): State<AppState>) -> impl IntoResponse {
    live_state(&state)
}

/// GET /api/live/frame.jpg
pub async fn get_latest_frame(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let (data, meta) = state
        .frames
        .get()
        .await
        .ok_or_else(|| Error::NotFound("no live frame available".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, meta.content_type.to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (
                header::HeaderName::from_static("x-frame-sequence"),
                meta.sequence.to_string(),
            ),
        ],
        data.as_ref().clone(),
    ))
}

/// PUT /api/live/thresholds/:zone_id
pub async fn set_threshold(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Json(req): Json<ThresholdRequest>,
) -> impl IntoResponse {
    let event = state.alerts.set_threshold(&zone_id, req.threshold).await;
    let status = state.alerts.get_status(&zone_id).await;

    if let (Some(event), Some(status)) = (event, status.as_ref()) {
        let count = status.last_count.unwrap_or(0);
        state
            .realtime
            .broadcast(HubMessage::CountAlert(CountAlertMessage {
                zone_id: zone_id.clone(),
                event,
                count,
                threshold: status.threshold,
                peak_count: status.peak_count,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }))
            .await;
        if event == AlertEvent::Raised {
            tracing::info!(zone_id = %zone_id, count, "Threshold change raised an alert");
        }
    }

    Json(ApiResponse::success(status))
}

/// GET /api/live/alerts
pub async fn list_alerts(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(serde_json::json!({
        "alerting": state.alerts.alerts().await,
        "zones": state.alerts.all_status().await,
    })))
}
