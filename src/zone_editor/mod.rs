//! ZoneEditController - Zone Editing Rules
//!
//! ## Responsibilities
//!
//! - Apply user intents (create/delete/rename, add/undo point, class filter)
//!   to the ZoneStore while enforcing the zone invariants
//! - Translate display-space pointer intents through the Viewport
//! - Import/export zone definitions (native pixel space)
//! - Emit "zones changed" after every applied mutation
//!
//! Rejected intents are no-ops: they return `false` and emit nothing.

use crate::error::{Error, Result};
use crate::geometry_mapper::{DisplayPoint, FrameSize, Point, Viewport};
use crate::zone_store::{ClassFilter, Rgb, Zone, ZoneDefinition, ZoneId, ZoneKind, ZoneStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Notification channel capacity
const EVENT_CAPACITY: usize = 256;

/// Editor configuration
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Polygon point cap shared by every zone in the session
    pub max_points: usize,
    /// Snap-to-close radius around a polygon's first point (display px)
    pub snap_radius_px: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_points: 12,
            snap_radius_px: 20.0,
        }
    }
}

/// Kind of applied mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneChange {
    Created,
    PointAdded,
    PointRemoved,
    Deleted,
    ActiveChanged,
    Renamed,
    ClassFilterChanged,
    KindChanged,
    Imported,
}

/// "Zones changed" notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonesChanged {
    pub change: ZoneChange,
    pub zone_id: Option<ZoneId>,
    pub active_id: Option<ZoneId>,
    pub zone_count: usize,
}

/// Pointer intent in display space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerIntent {
    /// Primary click at a display position
    Click(DisplayPoint),
    /// Secondary (right) click: undo last point of the active zone
    SecondaryClick,
    /// Double click: finish the active zone
    DoubleClick,
}

/// ZoneEditController instance
pub struct ZoneEditController {
    store: ZoneStore,
    config: EditorConfig,
    frame: Option<FrameSize>,
    drawing_kind: ZoneKind,
    events: broadcast::Sender<ZonesChanged>,
}

impl ZoneEditController {
    /// Create new controller
    pub fn new(config: EditorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: ZoneStore::new(),
            config,
            frame: None,
            drawing_kind: ZoneKind::default(),
            events,
        }
    }

    /// Subscribe to "zones changed"
    pub fn subscribe(&self) -> broadcast::Receiver<ZonesChanged> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Native frame size used for clamping
    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame
    }

    pub fn set_frame_size(&mut self, frame: FrameSize) {
        if frame.is_valid() {
            self.frame = Some(frame);
        }
    }

    pub fn drawing_kind(&self) -> ZoneKind {
        self.drawing_kind
    }

    /// Kind used for zones auto-created by pointer clicks
    pub fn set_drawing_kind(&mut self, kind: ZoneKind) {
        self.drawing_kind = kind;
    }

    // ========================================
    // Zone intents
    // ========================================

    /// Create an empty zone, which becomes active
    pub fn create_zone(
        &mut self,
        kind: ZoneKind,
        class_filter: ClassFilter,
        label: Option<String>,
    ) -> ZoneId {
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| format!("{} {}", kind.label_prefix(), self.store.len() + 1));

        let zone = Zone::new(kind, class_filter, label);
        let id = zone.id.clone();

        // Fresh UUIDs never collide with existing ids
        self.store.insert(zone);
        self.store.set_active(Some(id.clone()));

        tracing::info!(zone_id = %id, kind = ?kind, "Zone created");
        self.emit(ZoneChange::Created, Some(&id));
        id
    }

    /// Append a point to the active zone (clamped into the native frame)
    pub fn add_point(&mut self, id: &ZoneId, point: Point) -> bool {
        let Some(frame) = self.frame else {
            tracing::debug!(zone_id = %id, "Point rejected: native frame size unknown");
            return false;
        };
        if !self.store.is_active(id) {
            tracing::debug!(zone_id = %id, "Point rejected: zone not active");
            return false;
        }

        let max_points = self.config.max_points;
        let Some(zone) = self.store.get_mut(id) else {
            return false;
        };
        if !zone.can_accept_point(max_points) {
            tracing::debug!(zone_id = %id, points = zone.points.len(), "Point rejected: zone full");
            return false;
        }

        zone.points.push(frame.clamp(point));
        self.emit(ZoneChange::PointAdded, Some(id));
        true
    }

    /// Undo: pop the last point
    pub fn remove_last_point(&mut self, id: &ZoneId) -> bool {
        let popped = self
            .store
            .get_mut(id)
            .and_then(|zone| zone.points.pop())
            .is_some();

        if popped {
            self.emit(ZoneChange::PointRemoved, Some(id));
        }
        popped
    }

    pub fn delete_zone(&mut self, id: &ZoneId) -> bool {
        if self.store.remove(id).is_none() {
            return false;
        }
        tracing::info!(zone_id = %id, active = ?self.store.active_id(), "Zone deleted");
        self.emit(ZoneChange::Deleted, Some(id));
        true
    }

    /// Switch focus (`None` clears it). Unknown ids are a no-op.
    pub fn set_active_zone(&mut self, id: Option<ZoneId>) -> bool {
        if self.store.active_id() == id.as_ref() {
            return true;
        }
        if !self.store.set_active(id.clone()) {
            return false;
        }
        self.emit(ZoneChange::ActiveChanged, id.as_ref());
        true
    }

    pub fn rename_zone(&mut self, id: &ZoneId, label: String) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        let Some(zone) = self.store.get_mut(id) else {
            return false;
        };
        zone.label = label.to_string();
        self.emit(ZoneChange::Renamed, Some(id));
        true
    }

    /// Replace the class filter; the color follows the filter
    pub fn set_class_filter(&mut self, id: &ZoneId, class_filter: ClassFilter) -> bool {
        let Some(zone) = self.store.get_mut(id) else {
            return false;
        };
        zone.color = Rgb::for_filter(&class_filter);
        zone.class_filter = class_filter;
        self.emit(ZoneChange::ClassFilterChanged, Some(id));
        true
    }

    /// Change the kind of a zone that has no points yet
    pub fn set_kind(&mut self, id: &ZoneId, kind: ZoneKind) -> bool {
        let Some(zone) = self.store.get_mut(id) else {
            return false;
        };
        if !zone.points.is_empty() || zone.kind == kind {
            return false;
        }
        zone.kind = kind;
        self.emit(ZoneChange::KindChanged, Some(id));
        true
    }

    pub fn list_zones(&self) -> &[Zone] {
        self.store.zones()
    }

    pub fn is_complete(&self, id: &ZoneId) -> Option<bool> {
        self.store.get(id).map(Zone::is_complete)
    }

    /// Topmost complete polygon containing a native point
    pub fn zone_at(&self, point: &Point) -> Option<&Zone> {
        self.store.zone_at(point)
    }

    // ========================================
    // Pointer intents
    // ========================================

    /// Apply a display-space pointer intent. Returns true if anything changed.
    pub fn apply_pointer(&mut self, intent: PointerIntent, viewport: &Viewport) -> bool {
        match intent {
            PointerIntent::Click(p) => self.click(p, viewport),
            PointerIntent::SecondaryClick => match self.store.active_id().cloned() {
                Some(id) => self.remove_last_point(&id),
                None => false,
            },
            PointerIntent::DoubleClick => {
                let finishable = self
                    .store
                    .active_zone()
                    .map(|z| z.points.len() >= 2)
                    .unwrap_or(false);
                finishable && self.set_active_zone(None)
            }
        }
    }

    fn click(&mut self, p: DisplayPoint, viewport: &Viewport) -> bool {
        let Some(native) = viewport.to_native(p) else {
            tracing::debug!("Click ignored: viewport not ready");
            return false;
        };
        if let Some(frame) = viewport.native_size() {
            self.set_frame_size(frame);
        }
        let native = Point::new(native.x.round(), native.y.round());

        // Snap-to-close on the active polygon's first point
        let snap_target = self.store.active_zone().and_then(|zone| {
            (zone.kind == ZoneKind::Polygon && zone.points.len() >= 3)
                .then(|| zone.points[0])
        });
        if let Some(first) = snap_target.and_then(|f| viewport.to_display(f)) {
            if first.distance_to(&p) <= self.config.snap_radius_px {
                return self.set_active_zone(None);
            }
        }

        // Select a different zone under the pointer
        let hit = self
            .store
            .zone_at(&native)
            .map(|z| z.id.clone())
            .filter(|id| !self.store.is_active(id));
        if let Some(id) = hit {
            return self.set_active_zone(Some(id));
        }

        let max_points = self.config.max_points;
        let target = self
            .store
            .active_zone()
            .filter(|z| z.can_accept_point(max_points))
            .map(|z| z.id.clone());

        let id = match target {
            Some(id) => id,
            None => self.create_zone(self.drawing_kind, ClassFilter::new(), None),
        };
        self.add_point(&id, native)
    }

    // ========================================
    // Definitions payload
    // ========================================

    /// Every importable zone (2+ points) as an external definition
    pub fn export_definitions(&self) -> Vec<ZoneDefinition> {
        self.store
            .zones()
            .iter()
            .filter(|z| z.points.len() >= 2)
            .map(ZoneDefinition::from_zone)
            .collect()
    }

    /// Only complete zones (what is sent for processing)
    pub fn export_complete(&self) -> Vec<ZoneDefinition> {
        self.store
            .zones()
            .iter()
            .filter(|z| z.is_complete())
            .map(ZoneDefinition::from_zone)
            .collect()
    }

    /// Replace every zone with `defs`. All-or-nothing.
    pub fn import_definitions(
        &mut self,
        defs: Vec<ZoneDefinition>,
        frame: FrameSize,
    ) -> Result<usize> {
        if !frame.is_valid() {
            return Err(Error::NotReady(
                "native frame size unknown, cannot import zones".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let mut zones = Vec::with_capacity(defs.len());

        for def in defs {
            if !seen.insert(def.id.clone()) {
                return Err(Error::Validation(format!("duplicate zone id {}", def.id)));
            }
            let zone = def.into_zone(frame)?;
            if zone.points.len() > zone.kind.point_capacity(self.config.max_points) {
                return Err(Error::Validation(format!(
                    "zone {} exceeds the {} point limit",
                    zone.id, self.config.max_points
                )));
            }
            zones.push(zone);
        }

        let count = zones.len();
        self.frame = Some(frame);
        self.store.replace_all(zones);

        tracing::info!(zone_count = count, "Zone definitions imported");
        self.emit(ZoneChange::Imported, None);
        Ok(count)
    }

    fn emit(&self, change: ZoneChange, zone_id: Option<&ZoneId>) {
        let _ = self.events.send(ZonesChanged {
            change,
            zone_id: zone_id.cloned(),
            active_id: self.store.active_id().cloned(),
            zone_count: self.store.len(),
        });
    }
}

impl Default for ZoneEditController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone_store::CoordinateSpace;

    fn controller() -> ZoneEditController {
        let mut c = ZoneEditController::default();
        c.set_frame_size(FrameSize::new(1920, 1080));
        c
    }

    fn viewport() -> Viewport {
        // 1:1 display scale, no bars
        let mut v = Viewport::new();
        v.set_native_size(FrameSize::new(1920, 1080));
        v.resize_display(1920.0, 1080.0);
        v
    }

    fn click(x: f64, y: f64) -> PointerIntent {
        PointerIntent::Click(DisplayPoint::new(x, y))
    }

    #[test]
    fn test_create_zone_defaults() {
        let mut c = controller();
        let a = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        let b = c.create_zone(ZoneKind::Line, ClassFilter::new(), None);

        assert_eq!(c.list_zones()[0].label, "Zone 1");
        assert_eq!(c.list_zones()[1].label, "Line 2");
        assert!(c.list_zones()[1].points.is_empty());
        assert_eq!(c.store().active_id(), Some(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_line_never_exceeds_two_points() {
        let mut c = controller();
        let id = c.create_zone(ZoneKind::Line, ClassFilter::new(), None);

        for i in 0..10 {
            let applied = c.add_point(&id, Point::new(i as f64, i as f64));
            assert_eq!(applied, i < 2);
        }
        assert_eq!(c.store().get(&id).unwrap().points.len(), 2);
        assert_eq!(c.is_complete(&id), Some(true));
    }

    #[test]
    fn test_polygon_capped_at_max_points() {
        let mut c = ZoneEditController::new(EditorConfig {
            max_points: 4,
            ..EditorConfig::default()
        });
        c.set_frame_size(FrameSize::new(100, 100));
        let id = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);

        for i in 0..6 {
            c.add_point(&id, Point::new(i as f64, 0.0));
        }
        assert_eq!(c.store().get(&id).unwrap().points.len(), 4);
    }

    #[test]
    fn test_add_point_requires_active_zone() {
        let mut c = controller();
        let a = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        let _b = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);

        assert!(!c.add_point(&a, Point::new(1.0, 1.0)));
        assert!(!c.add_point(&ZoneId::from("missing"), Point::new(1.0, 1.0)));
        assert!(c.store().get(&a).unwrap().points.is_empty());
    }

    #[test]
    fn test_add_point_clamps_into_frame() {
        let mut c = controller();
        let id = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        c.add_point(&id, Point::new(-20.0, 5000.0));
        assert_eq!(c.store().get(&id).unwrap().points[0], Point::new(0.0, 1080.0));
    }

    #[test]
    fn test_remove_last_point_on_empty_zone() {
        let mut c = controller();
        let id = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        assert!(!c.remove_last_point(&id));
        assert!(c.store().get(&id).unwrap().points.is_empty());
    }

    #[test]
    fn test_square_complete_then_two_undos() {
        let mut c = controller();
        let id = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        for (x, y) in [(10.0, 10.0), (50.0, 10.0), (50.0, 50.0), (10.0, 50.0)] {
            assert!(c.add_point(&id, Point::new(x, y)));
        }
        assert_eq!(c.is_complete(&id), Some(true));

        c.remove_last_point(&id);
        c.remove_last_point(&id);
        assert_eq!(
            c.store().get(&id).unwrap().points,
            vec![Point::new(10.0, 10.0), Point::new(50.0, 10.0)]
        );
        assert_eq!(c.is_complete(&id), Some(false));
    }

    #[test]
    fn test_delete_active_reassigns_to_first_remaining() {
        let mut c = controller();
        let a = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        let _b = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        let d = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);

        assert!(c.delete_zone(&d));
        assert_eq!(c.store().active_id(), Some(&a));
        assert!(!c.delete_zone(&d));
    }

    #[test]
    fn test_set_kind_only_while_empty() {
        let mut c = controller();
        let id = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        assert!(c.set_kind(&id, ZoneKind::Line));
        c.add_point(&id, Point::new(1.0, 1.0));
        assert!(!c.set_kind(&id, ZoneKind::Polygon));
        assert_eq!(c.store().get(&id).unwrap().kind, ZoneKind::Line);
    }

    #[test]
    fn test_class_filter_recolors_zone() {
        let mut c = controller();
        let id = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        assert_eq!(c.store().get(&id).unwrap().color, crate::zone_store::DEFAULT_ZONE_COLOR);

        c.set_class_filter(&id, [2].into_iter().collect());
        assert_eq!(c.store().get(&id).unwrap().color, Rgb::for_class(2));
    }

    #[tokio::test]
    async fn test_rejected_intents_emit_nothing() {
        let mut c = controller();
        let mut rx = c.subscribe();

        let id = c.create_zone(ZoneKind::Line, ClassFilter::new(), Some("Gate".to_string()));
        assert_eq!(rx.try_recv().unwrap().change, ZoneChange::Created);

        assert!(!c.remove_last_point(&id));
        assert!(!c.set_active_zone(Some(ZoneId::from("missing"))));
        assert!(!c.rename_zone(&ZoneId::from("missing"), "x".to_string()));
        assert!(rx.try_recv().is_err());

        assert!(c.add_point(&id, Point::new(3.0, 4.0)));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.change, ZoneChange::PointAdded);
        assert_eq!(event.zone_id, Some(id));
    }

    #[test]
    fn test_pointer_clicks_build_polygon_and_snap_close() {
        let mut c = controller();
        let v = viewport();

        assert!(c.apply_pointer(click(100.4, 100.6), &v));
        let id = c.store().active_id().cloned().unwrap();
        assert_eq!(c.store().get(&id).unwrap().points[0], Point::new(100.0, 101.0));

        c.apply_pointer(click(300.0, 100.0), &v);
        c.apply_pointer(click(300.0, 300.0), &v);

        // Within 20px of the first point: closes instead of adding
        assert!(c.apply_pointer(click(110.0, 110.0), &v));
        assert!(c.store().active_id().is_none());
        assert_eq!(c.store().get(&id).unwrap().points.len(), 3);
    }

    #[test]
    fn test_click_inside_other_zone_selects_it() {
        let mut c = controller();
        let v = viewport();
        for (x, y) in [(0.0, 0.0), (200.0, 0.0), (200.0, 200.0)] {
            c.apply_pointer(click(x, y), &v);
        }
        let first = c.store().active_id().cloned().unwrap();
        c.apply_pointer(PointerIntent::DoubleClick, &v);
        assert!(c.store().active_id().is_none());

        assert!(c.apply_pointer(click(150.0, 50.0), &v));
        assert_eq!(c.store().active_id(), Some(&first));
        assert_eq!(c.list_zones().len(), 1);
    }

    #[test]
    fn test_click_on_full_line_starts_new_zone() {
        let mut c = controller();
        let v = viewport();
        c.set_drawing_kind(ZoneKind::Line);

        c.apply_pointer(click(10.0, 10.0), &v);
        c.apply_pointer(click(500.0, 10.0), &v);
        c.apply_pointer(click(10.0, 900.0), &v);

        assert_eq!(c.list_zones().len(), 2);
        assert_eq!(c.list_zones()[1].label, "Line 2");
        assert_eq!(c.list_zones()[1].points.len(), 1);
    }

    #[test]
    fn test_pointer_ignored_until_viewport_ready() {
        let mut c = controller();
        let v = Viewport::new();
        assert!(!c.apply_pointer(click(10.0, 10.0), &v));
        assert!(c.list_zones().is_empty());
    }

    #[test]
    fn test_secondary_click_undoes_and_double_click_needs_two_points() {
        let mut c = controller();
        let v = viewport();
        c.apply_pointer(click(10.0, 10.0), &v);
        assert!(!c.apply_pointer(PointerIntent::DoubleClick, &v));

        assert!(c.apply_pointer(PointerIntent::SecondaryClick, &v));
        assert!(c.list_zones()[0].points.is_empty());
    }

    #[test]
    fn test_pointer_intent_json() {
        let intent: PointerIntent =
            serde_json::from_str(r#"{"type":"click","x":12.5,"y":3}"#).unwrap();
        assert_eq!(intent, click(12.5, 3.0));
        let intent: PointerIntent = serde_json::from_str(r#"{"type":"double_click"}"#).unwrap();
        assert_eq!(intent, PointerIntent::DoubleClick);
    }

    #[test]
    fn test_import_replaces_all_and_export_complete_filters() {
        let mut c = controller();
        c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);

        let defs = vec![
            ZoneDefinition {
                id: "door".to_string(),
                points: vec![Point::new(0.1, 0.1), Point::new(0.5, 0.1), Point::new(0.5, 0.5)],
                kind: None,
                class_filter: vec![0],
                label: "Door".to_string(),
                color: None,
                coordinate_space: CoordinateSpace::Normalized,
            },
            ZoneDefinition {
                id: "gate".to_string(),
                points: vec![Point::new(10.0, 10.0), Point::new(90.0, 10.0)],
                kind: None,
                class_filter: vec![],
                label: "Gate".to_string(),
                color: None,
                coordinate_space: CoordinateSpace::Native,
            },
        ];

        assert_eq!(c.import_definitions(defs, FrameSize::new(1000, 1000)).unwrap(), 2);
        assert_eq!(c.list_zones().len(), 2);
        assert_eq!(c.store().active_id(), Some(&ZoneId::from("door")));
        assert_eq!(c.list_zones()[0].points[1], Point::new(500.0, 100.0));

        let gate = ZoneId::from("gate");
        c.set_active_zone(Some(gate.clone()));
        c.remove_last_point(&gate);
        let complete = c.export_complete();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0].id, "door");
        // The 1-point gate cannot be imported back
        assert_eq!(c.export_definitions().len(), 1);
    }

    #[test]
    fn test_import_rejects_duplicates_without_mutating() {
        let mut c = controller();
        let existing = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        let def = ZoneDefinition {
            id: "a".to_string(),
            points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            kind: None,
            class_filter: vec![],
            label: "A".to_string(),
            color: None,
            coordinate_space: CoordinateSpace::Native,
        };

        let result = c.import_definitions(vec![def.clone(), def], FrameSize::new(100, 100));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(c.list_zones().len(), 1);
        assert_eq!(c.list_zones()[0].id, existing);
    }

    #[test]
    fn test_definitions_export_imports_back_unchanged() {
        let mut c = controller();
        let unfinished = c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);
        c.add_point(&unfinished, Point::new(10.0, 10.0));
        c.add_point(&unfinished, Point::new(80.0, 10.0));
        let gate = c.create_zone(ZoneKind::Line, [3].into_iter().collect(), None);
        c.add_point(&gate, Point::new(0.0, 500.0));
        c.add_point(&gate, Point::new(1920.0, 500.0));
        c.create_zone(ZoneKind::Polygon, ClassFilter::new(), None);

        let exported = c.export_definitions();
        assert_eq!(exported.len(), 2);

        let mut restored = ZoneEditController::default();
        assert_eq!(
            restored
                .import_definitions(exported.clone(), FrameSize::new(1920, 1080))
                .unwrap(),
            2
        );
        assert_eq!(restored.store().get(&unfinished).unwrap().kind, ZoneKind::Polygon);
        assert_eq!(restored.store().get(&gate).unwrap().kind, ZoneKind::Line);
        assert_eq!(restored.export_definitions(), exported);
    }

    #[test]
    fn test_import_rejects_unknown_frame() {
        let mut c = ZoneEditController::default();
        let result = c.import_definitions(Vec::new(), FrameSize::new(0, 0));
        assert!(matches!(result, Err(Error::NotReady(_))));
        assert!(c.frame_size().is_none());
    }
}
