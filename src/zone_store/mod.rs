//! ZoneStore - Authoritative Zone Collection
//!
//! ## Responsibilities
//!
//! - Ordered collection of zones (drawing order = list order)
//! - The single "active" zone reference (accepting new points)
//! - Activation hand-off when the active zone is removed
//!
//! Editing rules (caps, active-only point adds, kind locking) live in
//! `ZoneEditController`; the store only guards structural invariants.

mod payload;
mod types;

pub use payload::{CoordinateSpace, ZoneDefinition, FULL_FRAME_ZONE_ID};
pub use types::*;

use crate::geometry_mapper::Point;

/// In-memory zone collection
#[derive(Debug, Default)]
pub struct ZoneStore {
    zones: Vec<Zone>,
    active: Option<ZoneId>,
}

impl ZoneStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All zones in drawing order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| &z.id == id)
    }

    pub fn contains(&self, id: &ZoneId) -> bool {
        self.get(id).is_some()
    }

    /// Currently active zone id
    pub fn active_id(&self) -> Option<&ZoneId> {
        self.active.as_ref()
    }

    pub fn active_zone(&self) -> Option<&Zone> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    pub fn is_active(&self, id: &ZoneId) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// Topmost (last drawn) complete polygon containing `p`
    pub fn zone_at(&self, p: &Point) -> Option<&Zone> {
        self.zones.iter().rev().find(|z| z.contains(p))
    }

    /// Append a zone. Rejected (false) if its id is already taken.
    pub(crate) fn insert(&mut self, zone: Zone) -> bool {
        if self.contains(&zone.id) {
            tracing::warn!(zone_id = %zone.id, "Duplicate zone id rejected");
            return false;
        }
        self.zones.push(zone);
        true
    }

    /// Remove a zone. If it was active, the first remaining zone (or none)
    /// becomes active.
    pub(crate) fn remove(&mut self, id: &ZoneId) -> Option<Zone> {
        let idx = self.zones.iter().position(|z| &z.id == id)?;
        let removed = self.zones.remove(idx);

        if self.is_active(id) {
            self.active = self.zones.first().map(|z| z.id.clone());
        }

        Some(removed)
    }

    /// Switch the active zone. Unknown ids are rejected (false).
    pub(crate) fn set_active(&mut self, id: Option<ZoneId>) -> bool {
        match id {
            Some(id) if !self.contains(&id) => false,
            id => {
                self.active = id;
                true
            }
        }
    }

    /// Replace every zone. Activation moves to the first zone (or none).
    pub(crate) fn replace_all(&mut self, zones: Vec<Zone>) {
        self.active = zones.first().map(|z| z.id.clone());
        self.zones = zones;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(label: &str) -> Zone {
        Zone::new(ZoneKind::Polygon, ClassFilter::new(), label.to_string())
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut store = ZoneStore::new();
        let a = zone("Zone 1");
        let dup = Zone::with_id(
            a.id.clone(),
            ZoneKind::Line,
            ClassFilter::new(),
            "Line 2".to_string(),
        );

        assert!(store.insert(a));
        assert!(!store.insert(dup));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_active_moves_activation_to_first_remaining() {
        let mut store = ZoneStore::new();
        let (a, b, c) = (zone("Zone 1"), zone("Zone 2"), zone("Zone 3"));
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());
        store.insert(a);
        store.insert(b);
        store.insert(c);
        store.set_active(Some(b_id.clone()));

        store.remove(&b_id);
        assert_eq!(store.active_id(), Some(&a_id));

        store.remove(&a_id);
        assert_eq!(store.active_id(), Some(&c_id));

        store.remove(&c_id);
        assert!(store.active_id().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_inactive_keeps_activation() {
        let mut store = ZoneStore::new();
        let (a, b) = (zone("Zone 1"), zone("Zone 2"));
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        store.insert(a);
        store.insert(b);
        store.set_active(Some(b_id.clone()));

        store.remove(&a_id);
        assert_eq!(store.active_id(), Some(&b_id));
    }

    #[test]
    fn test_set_active_unknown_id_rejected() {
        let mut store = ZoneStore::new();
        assert!(!store.set_active(Some(ZoneId::from("missing"))));
        assert!(store.set_active(None));
    }

    #[test]
    fn test_zone_at_prefers_topmost() {
        let mut store = ZoneStore::new();
        let mut lower = zone("Zone 1");
        lower.points = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let mut upper = zone("Zone 2");
        upper.points = vec![
            Point::new(40.0, 40.0),
            Point::new(60.0, 40.0),
            Point::new(60.0, 60.0),
        ];
        let upper_id = upper.id.clone();
        let lower_id = lower.id.clone();
        store.insert(lower);
        store.insert(upper);

        assert_eq!(store.zone_at(&Point::new(55.0, 45.0)).map(|z| &z.id), Some(&upper_id));
        assert_eq!(store.zone_at(&Point::new(10.0, 90.0)).map(|z| &z.id), Some(&lower_id));
        assert!(store.zone_at(&Point::new(150.0, 150.0)).is_none());
    }
}
