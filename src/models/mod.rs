//! Shared data models

use crate::geometry_mapper::{ContainRect, FrameSize};
use crate::stream_manager::ConnectionSnapshot;
use crate::zone_store::{Zone, ZoneId, ZoneKind};
use serde::{Deserialize, Serialize};

/// API response wrapper
///
/// Failures are reported through `Error`'s `IntoResponse` instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub live_state: String,
    pub ws_clients: u64,
}

/// Result of a zone intent. `applied = false` means it was a no-op.
#[derive(Debug, Serialize)]
pub struct IntentResult {
    pub applied: bool,
    pub active_id: Option<ZoneId>,
}

/// Zone list with the active zone
#[derive(Debug, Serialize)]
pub struct ZoneListResponse {
    pub zones: Vec<ZoneView>,
    pub active_id: Option<ZoneId>,
    pub max_points: usize,
}

/// Zone plus derived flags
#[derive(Debug, Serialize)]
pub struct ZoneView {
    #[serde(flatten)]
    pub zone: Zone,
    pub complete: bool,
    pub active: bool,
}

/// POST /api/zones
#[derive(Debug, Deserialize)]
pub struct CreateZoneRequest {
    #[serde(default)]
    pub kind: ZoneKind,
    #[serde(default)]
    pub class_filter: Vec<u32>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateZoneResponse {
    pub id: ZoneId,
}

#[derive(Debug, Deserialize)]
pub struct RenameZoneRequest {
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassFilterRequest {
    pub class_filter: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SetKindRequest {
    pub kind: ZoneKind,
}

/// PUT /api/zones/active
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub id: Option<ZoneId>,
}

/// PUT /api/zones/definitions
#[derive(Debug, Deserialize)]
pub struct ImportDefinitionsRequest {
    /// Defaults to the viewport's native size
    pub native_size: Option<FrameSize>,
    pub zones: Vec<crate::zone_store::ZoneDefinition>,
}

/// GET /api/zones/export query
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Only complete zones
    #[serde(default)]
    pub complete_only: bool,
    /// Append the full-frame zone with this class filter (comma separated ids)
    pub full_frame_classes: Option<String>,
}

/// PUT /api/viewport
#[derive(Debug, Deserialize)]
pub struct ViewportRequest {
    pub display_width: Option<f64>,
    pub display_height: Option<f64>,
    pub native_size: Option<FrameSize>,
}

#[derive(Debug, Serialize)]
pub struct ViewportResponse {
    pub display_width: f64,
    pub display_height: f64,
    pub native_size: Option<FrameSize>,
    pub content_rect: Option<ContainRect>,
    pub display_scale: Option<f64>,
    pub ready: bool,
}

/// POST /api/live/start
#[derive(Debug, Deserialize)]
pub struct StartLiveRequest {
    pub task_id: String,
}

/// GET /api/live/state
#[derive(Debug, Serialize)]
pub struct LiveStateResponse {
    #[serde(flatten)]
    pub snapshot: ConnectionSnapshot,
    pub running: bool,
}

/// PUT /api/live/thresholds/:zone_id
#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    /// `null` or 0 disables the alert
    pub threshold: Option<u64>,
}
