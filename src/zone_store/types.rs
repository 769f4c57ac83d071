//! Zone entity types

use crate::geometry_mapper::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Golden angle step (degrees) used to spread class colors around the hue wheel
const GOLDEN_ANGLE_DEG: f64 = 137.508;
const CLASS_COLOR_SATURATION: f64 = 0.85;
const CLASS_COLOR_LIGHTNESS: f64 = 0.55;

/// Color of zones that match every class
pub const DEFAULT_ZONE_COLOR: Rgb = Rgb(251, 189, 5);

/// Zone identifier (unique within a store, immutable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// New random id (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ZoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zone geometry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Polygon,
    Line,
}

impl ZoneKind {
    /// Maximum number of points a zone of this kind may hold
    pub fn point_capacity(&self, max_points: usize) -> usize {
        match self {
            ZoneKind::Line => 2,
            ZoneKind::Polygon => max_points,
        }
    }

    /// Points required before the zone is complete
    pub fn min_complete_points(&self) -> usize {
        match self {
            ZoneKind::Line => 2,
            ZoneKind::Polygon => 3,
        }
    }

    /// Kind implied by a point count (2 => line, 3+ => polygon)
    pub fn infer(point_count: usize) -> Option<ZoneKind> {
        match point_count {
            0 | 1 => None,
            2 => Some(ZoneKind::Line),
            _ => Some(ZoneKind::Polygon),
        }
    }

    /// Prefix of auto-generated labels
    pub fn label_prefix(&self) -> &'static str {
        match self {
            ZoneKind::Line => "Line",
            ZoneKind::Polygon => "Zone",
        }
    }
}

impl Default for ZoneKind {
    fn default() -> Self {
        Self::Polygon
    }
}

/// Detector class ids a zone counts. Empty = all classes.
pub type ClassFilter = BTreeSet<u32>;

/// RGB color, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Distinct color for a detector class (golden angle hue, HLS -> RGB)
    pub fn for_class(class_id: u32) -> Self {
        let h = ((class_id as f64 * GOLDEN_ANGLE_DEG) % 360.0) / 360.0;
        let l = CLASS_COLOR_LIGHTNESS;
        let s = CLASS_COLOR_SATURATION;

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h * 6.0 {
            h6 if h6 < 1.0 => (c, x, 0.0),
            h6 if h6 < 2.0 => (x, c, 0.0),
            h6 if h6 < 3.0 => (0.0, c, x),
            h6 if h6 < 4.0 => (0.0, x, c),
            h6 if h6 < 5.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb(channel(r), channel(g), channel(b))
    }

    /// Color of a zone with the given class filter (lowest class id wins)
    pub fn for_filter(filter: &ClassFilter) -> Self {
        filter
            .iter()
            .next()
            .map(|id| Self::for_class(*id))
            .unwrap_or(DEFAULT_ZONE_COLOR)
    }
}

/// Zone entity. Points are native pixel space, in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub points: Vec<Point>,
    pub kind: ZoneKind,
    pub label: String,
    pub class_filter: ClassFilter,
    pub color: Rgb,
}

impl Zone {
    /// New empty zone with a fresh id
    pub fn new(kind: ZoneKind, class_filter: ClassFilter, label: String) -> Self {
        Self::with_id(ZoneId::generate(), kind, class_filter, label)
    }

    pub(crate) fn with_id(
        id: ZoneId,
        kind: ZoneKind,
        class_filter: ClassFilter,
        label: String,
    ) -> Self {
        let color = Rgb::for_filter(&class_filter);
        Self {
            id,
            points: Vec::new(),
            kind,
            label,
            class_filter,
            color,
        }
    }

    /// Line: exactly 2 points. Polygon: 3 or more.
    pub fn is_complete(&self) -> bool {
        match self.kind {
            ZoneKind::Line => self.points.len() == 2,
            ZoneKind::Polygon => self.points.len() >= 3,
        }
    }

    /// Whether one more point fits under the kind's cap
    pub fn can_accept_point(&self, max_points: usize) -> bool {
        self.points.len() < self.kind.point_capacity(max_points)
    }

    /// Point-in-polygon (ray casting). Lines and incomplete polygons contain nothing.
    pub fn contains(&self, p: &Point) -> bool {
        if self.kind != ZoneKind::Polygon || !self.is_complete() {
            return false;
        }

        let pts = &self.points;
        let mut inside = false;
        let mut j = pts.len() - 1;
        for i in 0..pts.len() {
            let (vi, vj) = (pts[i], pts[j]);
            if ((vi.y > p.y) != (vj.y > p.y))
                && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}
