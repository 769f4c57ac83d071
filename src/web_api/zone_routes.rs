//! Zone API Routes
//!
//! Zone editing, pointer intents, viewport and definitions import/export.
//! Lock order: viewport before editor.

use crate::error::{Error, Result};
use crate::geometry_mapper::{Point, Viewport};
use crate::models::{
    ApiResponse, ClassFilterRequest, CreateZoneRequest, CreateZoneResponse, ExportQuery,
    ImportDefinitionsRequest, IntentResult, RenameZoneRequest, SetActiveRequest, SetKindRequest,
    ViewportRequest, ViewportResponse, ZoneListResponse, ZoneView,
};
use crate::state::AppState;
use crate::zone_editor::{PointerIntent, ZoneEditController};
use crate::zone_store::{ClassFilter, ZoneDefinition, ZoneId};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

fn zone_list(editor: &ZoneEditController) -> ZoneListResponse {
    let store = editor.store();
    ZoneListResponse {
        zones: editor
            .list_zones()
            .iter()
            .map(|z| ZoneView {
                complete: z.is_complete(),
                active: store.is_active(&z.id),
                zone: z.clone(),
            })
            .collect(),
        active_id: store.active_id().cloned(),
        max_points: editor.config().max_points,
    }
}

fn intent(editor: &ZoneEditController, applied: bool) -> Json<ApiResponse<IntentResult>> {
    Json(ApiResponse::success(IntentResult {
        applied,
        active_id: editor.store().active_id().cloned(),
    }))
}

fn viewport_view(viewport: &Viewport) -> ViewportResponse {
    let (display_width, display_height) = viewport.display_size();
    ViewportResponse {
        display_width,
        display_height,
        native_size: viewport.native_size(),
        content_rect: viewport.content_rect(),
        display_scale: viewport.display_scale(),
        ready: viewport.is_ready(),
    }
}

/// GET /api/zones
pub async fn list_zones(State(state): State<AppState>) -> impl IntoResponse {
    let editor = state.editor.read().await;
    Json(ApiResponse::success(zone_list(&editor)))
}

/// POST /api/zones
pub async fn create_zone(
    State(state): State<AppState>,
    Json(req): Json<CreateZoneRequest>,
) -> impl IntoResponse {
    let class_filter: ClassFilter = req.class_filter.into_iter().collect();
    let id = state
        .editor
        .write()
        .await
        .create_zone(req.kind, class_filter, req.label);

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateZoneResponse { id })),
    )
}

/// DELETE /api/zones/:id
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = ZoneId::from(id);
    let mut editor = state.editor.write().await;
    let applied = editor.delete_zone(&id);
    if applied {
        state.alerts.remove(id.as_str()).await;
    }
    intent(&editor, applied)
}

/// PUT /api/zones/:id/label
pub async fn rename_zone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameZoneRequest>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let applied = editor.rename_zone(&ZoneId::from(id), req.label);
    intent(&editor, applied)
}

/// PUT /api/zones/:id/classes
pub async fn set_class_filter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ClassFilterRequest>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let applied = editor.set_class_filter(&ZoneId::from(id), req.class_filter.into_iter().collect());
    intent(&editor, applied)
}

/// PUT /api/zones/:id/kind
pub async fn set_kind(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetKindRequest>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let applied = editor.set_kind(&ZoneId::from(id), req.kind);
    intent(&editor, applied)
}

/// PUT /api/zones/drawing-kind (kind of zones auto-created by clicks)
pub async fn set_drawing_kind(
    State(state): State<AppState>,
    Json(req): Json<SetKindRequest>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    editor.set_drawing_kind(req.kind);
    intent(&editor, true)
}

/// POST /api/zones/:id/points (native pixel space)
pub async fn add_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(point): Json<Point>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let applied = editor.add_point(&ZoneId::from(id), point);
    intent(&editor, applied)
}

/// DELETE /api/zones/:id/points/last
pub async fn remove_last_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let applied = editor.remove_last_point(&ZoneId::from(id));
    intent(&editor, applied)
}

/// PUT /api/zones/active
pub async fn set_active_zone(
    State(state): State<AppState>,
    Json(req): Json<SetActiveRequest>,
) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let applied = editor.set_active_zone(req.id);
    intent(&editor, applied)
}

/// GET /api/zones/definitions
pub async fn export_definitions(State(state): State<AppState>) -> impl IntoResponse {
    let editor = state.editor.read().await;
    Json(ApiResponse::success(editor.export_definitions()))
}

/// PUT /api/zones/definitions (replace all)
///
/// An explicit `native_size` also becomes the viewport's native size so later
/// pointer conversions use the same frame as the imported points.
pub async fn import_definitions(
    State(state): State<AppState>,
    Json(req): Json<ImportDefinitionsRequest>,
) -> Result<impl IntoResponse> {
    let mut viewport = state.viewport.write().await;
    let native = match req.native_size {
        Some(size) if !size.is_valid() => {
            return Err(Error::Validation(format!(
                "invalid native size {}x{}",
                size.width, size.height
            )));
        }
        Some(size) => size,
        None => viewport.native_size().ok_or_else(|| {
            Error::NotReady("native_size missing and viewport native size unknown".to_string())
        })?,
    };

    let mut editor = state.editor.write().await;
    let imported = editor.import_definitions(req.zones, native)?;
    viewport.set_native_size(native);
    tracing::info!(imported, width = native.width, height = native.height, "Zones imported via API");

    Ok(Json(ApiResponse::success(zone_list(&editor))))
}

/// GET /api/zones/export
///
/// Payload sent for processing: complete zones, optionally plus the
/// full-frame zone.
pub async fn export_zones(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let editor = state.editor.read().await;
    let mut defs = if query.complete_only {
        editor.export_complete()
    } else {
        editor.export_definitions()
    };

    if let Some(classes) = query.full_frame_classes.as_deref() {
        let native = editor
            .frame_size()
            .ok_or_else(|| Error::NotReady("native frame size unknown".to_string()))?;
        defs.push(ZoneDefinition::full_frame(&parse_class_list(classes)?, native));
    }

    Ok(Json(ApiResponse::success(defs)))
}

fn parse_class_list(raw: &str) -> Result<ClassFilter> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| Error::Validation(format!("invalid class id: {}", s)))
        })
        .collect()
}

/// GET /api/viewport
pub async fn get_viewport(State(state): State<AppState>) -> impl IntoResponse {
    let viewport = state.viewport.read().await;
    Json(ApiResponse::success(viewport_view(&viewport)))
}

/// PUT /api/viewport
pub async fn update_viewport(
    State(state): State<AppState>,
    Json(req): Json<ViewportRequest>,
) -> Result<impl IntoResponse> {
    let mut viewport = state.viewport.write().await;

    if let (Some(w), Some(h)) = (req.display_width, req.display_height) {
        if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
            return Err(Error::Validation(format!("invalid display size {}x{}", w, h)));
        }
        viewport.resize_display(w, h);
    }

    if let Some(native) = req.native_size {
        if !native.is_valid() {
            return Err(Error::Validation(format!(
                "invalid native size {}x{}",
                native.width, native.height
            )));
        }
        viewport.set_native_size(native);
        state.editor.write().await.set_frame_size(native);
    }

    Ok(Json(ApiResponse::success(viewport_view(&viewport))))
}

/// POST /api/viewport/pointer (display space)
pub async fn apply_pointer(
    State(state): State<AppState>,
    Json(intent_req): Json<PointerIntent>,
) -> impl IntoResponse {
    let viewport = state.viewport.read().await;
    let mut editor = state.editor.write().await;
    let applied = editor.apply_pointer(intent_req, &viewport);
    intent(&editor, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_mapper::{DisplayPoint, FrameSize};
    use crate::state::AppConfig;
    use crate::zone_store::{CoordinateSpace, ZoneKind};

    async fn state_with_square_viewport() -> AppState {
        let state = AppState::build(AppConfig::default()).unwrap();
        {
            let mut viewport = state.viewport.write().await;
            viewport.set_native_size(FrameSize::new(1000, 1000));
            viewport.resize_display(1000.0, 1000.0);
            state.editor.write().await.set_frame_size(FrameSize::new(1000, 1000));
        }
        state
    }

    fn dock_line() -> ZoneDefinition {
        ZoneDefinition {
            id: "dock".to_string(),
            points: vec![Point::new(0.0, 0.0), Point::new(1920.0, 1080.0)],
            kind: None,
            class_filter: vec![],
            label: "Dock".to_string(),
            color: None,
            coordinate_space: CoordinateSpace::Native,
        }
    }

    #[tokio::test]
    async fn test_import_with_native_size_updates_viewport() {
        let state = state_with_square_viewport().await;
        let req = ImportDefinitionsRequest {
            native_size: Some(FrameSize::new(1920, 1080)),
            zones: vec![dock_line()],
        };
        assert!(import_definitions(State(state.clone()), Json(req)).await.is_ok());
        assert_eq!(
            state.viewport.read().await.native_size(),
            Some(FrameSize::new(1920, 1080))
        );

        // Letterboxed 1000x562.5 at y=218.75; the dock line is full so a new zone starts
        apply_pointer(
            State(state.clone()),
            Json(PointerIntent::Click(DisplayPoint::new(500.0, 500.0))),
        )
        .await;

        let editor = state.editor.read().await;
        assert_eq!(editor.frame_size(), Some(FrameSize::new(1920, 1080)));
        assert_eq!(editor.list_zones().len(), 2);
        assert_eq!(editor.list_zones()[1].points, vec![Point::new(960.0, 540.0)]);
    }

    #[tokio::test]
    async fn test_failed_import_leaves_viewport_alone() {
        let state = state_with_square_viewport().await;
        let mut short = dock_line();
        short.points.truncate(1);
        let req = ImportDefinitionsRequest {
            native_size: Some(FrameSize::new(1920, 1080)),
            zones: vec![short],
        };

        assert!(matches!(
            import_definitions(State(state.clone()), Json(req)).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(
            state.viewport.read().await.native_size(),
            Some(FrameSize::new(1000, 1000))
        );
        assert_eq!(
            state.editor.read().await.frame_size(),
            Some(FrameSize::new(1000, 1000))
        );
    }

    #[tokio::test]
    async fn test_drawing_kind_used_for_click_created_zones() {
        let state = state_with_square_viewport().await;
        set_drawing_kind(
            State(state.clone()),
            Json(SetKindRequest {
                kind: ZoneKind::Line,
            }),
        )
        .await;
        apply_pointer(
            State(state.clone()),
            Json(PointerIntent::Click(DisplayPoint::new(10.0, 10.0))),
        )
        .await;

        let editor = state.editor.read().await;
        assert_eq!(editor.list_zones()[0].kind, ZoneKind::Line);
        assert_eq!(editor.list_zones()[0].label, "Line 1");
    }

    #[test]
    fn test_parse_class_list() {
        let filter = parse_class_list("2, 0,,7").unwrap();
        assert_eq!(filter.into_iter().collect::<Vec<_>>(), vec![0, 2, 7]);
        assert!(parse_class_list("").unwrap().is_empty());
        assert!(matches!(parse_class_list("1,x"), Err(Error::Validation(_))));
    }
}
