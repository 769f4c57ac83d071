//! Zone definition payload (persistence / processing contract)
//!
//! Points are native pixel space unless the payload explicitly says
//! otherwise through `coordinateSpace`. Nothing is inferred from magnitude.

use super::types::{ClassFilter, Rgb, Zone, ZoneId, ZoneKind};
use crate::error::{Error, Result};
use crate::geometry_mapper::{FrameSize, Point};
use serde::{Deserialize, Serialize};

/// Id of the synthetic zone covering the whole frame
pub const FULL_FRAME_ZONE_ID: &str = "global";

/// Coordinate space of the points in a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Native video pixels
    #[default]
    Native,
    /// Fractions of the native width/height (0.0 - 1.0)
    Normalized,
}

/// External zone definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDefinition {
    pub id: String,
    pub points: Vec<Point>,
    /// Written on export. When absent, import infers it from the point count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ZoneKind>,
    #[serde(default)]
    pub class_filter: Vec<u32>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub coordinate_space: CoordinateSpace,
}

impl ZoneDefinition {
    /// Export a zone (always native space)
    pub fn from_zone(zone: &Zone) -> Self {
        Self {
            id: zone.id.to_string(),
            points: zone.points.clone(),
            kind: Some(zone.kind),
            class_filter: zone.class_filter.iter().copied().collect(),
            label: zone.label.clone(),
            color: Some(zone.color),
            coordinate_space: CoordinateSpace::Native,
        }
    }

    /// Polygon covering the whole frame, used for frame-wide detection
    pub fn full_frame(class_filter: &ClassFilter, frame: FrameSize) -> Self {
        let (w, h) = (frame.width as f64, frame.height as f64);
        Self {
            id: FULL_FRAME_ZONE_ID.to_string(),
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
            kind: Some(ZoneKind::Polygon),
            class_filter: class_filter.iter().copied().collect(),
            label: "Global Detection".to_string(),
            color: Some(Rgb::for_filter(class_filter)),
            coordinate_space: CoordinateSpace::Native,
        }
    }

    /// Validate and convert into a stored zone, clamped into `frame`
    pub fn into_zone(self, frame: FrameSize) -> Result<Zone> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("zone id must not be empty".to_string()));
        }
        if !frame.is_valid() {
            return Err(Error::NotReady(
                "native frame size unknown, cannot import zones".to_string(),
            ));
        }

        let inferred = ZoneKind::infer(self.points.len()).ok_or_else(|| {
            Error::Validation(format!(
                "zone {} has {} point(s); at least 2 are required",
                self.id,
                self.points.len()
            ))
        })?;
        // A 2-point polygon is an unfinished polygon, not a line
        let kind = match self.kind {
            None => inferred,
            Some(ZoneKind::Polygon) => ZoneKind::Polygon,
            Some(ZoneKind::Line) if inferred == ZoneKind::Line => ZoneKind::Line,
            Some(ZoneKind::Line) => {
                return Err(Error::Validation(format!(
                    "zone {} is a line but has {} points",
                    self.id,
                    self.points.len()
                )));
            }
        };

        if self
            .points
            .iter()
            .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(Error::Validation(format!(
                "zone {} has non-finite coordinates",
                self.id
            )));
        }

        let (w, h) = (frame.width as f64, frame.height as f64);
        let points = self
            .points
            .into_iter()
            .map(|p| match self.coordinate_space {
                CoordinateSpace::Native => p,
                CoordinateSpace::Normalized => Point::new(p.x * w, p.y * h),
            })
            .map(|p| frame.clamp(p))
            .collect();

        let class_filter: ClassFilter = self.class_filter.into_iter().collect();
        let mut zone = Zone::with_id(ZoneId::from(self.id), kind, class_filter, self.label);
        if let Some(color) = self.color {
            zone.color = color;
        }
        zone.points = points;

        Ok(zone)
    }
}
