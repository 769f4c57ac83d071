//! GeometryMapper - Display/Native Coordinate Mapping
//!
//! ## Responsibilities
//!
//! - Compute the content rectangle of a video rendered with "contain" fit
//!   (letterbox / pillarbox) inside a display surface
//! - Convert points between display space and native video pixel space
//! - Viewport: own the current surface + native size, recompute eagerly and
//!   notify subscribers when the dimensions change
//!
//! Native space is the storage space. Display space is only ever used for
//! pointer input and rendering, never persisted.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Notification channel capacity
const EVENT_CAPACITY: usize = 64;

/// Point in native video pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another native point
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Point in display surface pixel space (relative to the surface's top-left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &DisplayPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Native video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions non-zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Clamp a native point into `[0,width]x[0,height]`
    pub fn clamp(&self, p: Point) -> Point {
        Point {
            x: clamp_axis(p.x, self.width as f64),
            y: clamp_axis(p.y, self.height as f64),
        }
    }
}

/// Rectangle within the display surface that actually shows video content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainRect {
    pub offset_x: f64,
    pub offset_y: f64,
    pub render_w: f64,
    pub render_h: f64,
}

/// Compute the "contain" fit of a `native_w x native_h` video inside a
/// `display_w x display_h` surface.
///
/// Returns `None` ("not ready") when either size is degenerate.
pub fn compute_contain_rect(
    display_w: f64,
    display_h: f64,
    native_w: f64,
    native_h: f64,
) -> Option<ContainRect> {
    // Written as negated comparisons so NaN also counts as degenerate
    if !(native_w > 0.0 && native_h > 0.0 && display_w > 0.0 && display_h > 0.0) {
        return None;
    }

    let display_ratio = display_w / display_h;
    let native_ratio = native_w / native_h;

    if display_ratio > native_ratio {
        // Pillarbox: height fully used, bars left/right
        let render_w = display_h * native_ratio;
        Some(ContainRect {
            offset_x: (display_w - render_w) / 2.0,
            offset_y: 0.0,
            render_w,
            render_h: display_h,
        })
    } else {
        // Letterbox: width fully used, bars top/bottom
        let render_h = display_w / native_ratio;
        Some(ContainRect {
            offset_x: 0.0,
            offset_y: (display_h - render_h) / 2.0,
            render_w: display_w,
            render_h,
        })
    }
}

/// Display point -> native point, clamped into the native frame.
///
/// `rect` must have been computed for the same native size.
pub fn to_native(p: DisplayPoint, rect: &ContainRect, native_w: f64, native_h: f64) -> Point {
    let scale_x = rect.render_w / native_w;
    let scale_y = rect.render_h / native_h;

    Point {
        x: clamp_axis((p.x - rect.offset_x) / scale_x, native_w),
        y: clamp_axis((p.y - rect.offset_y) / scale_y, native_h),
    }
}

/// Native point -> display point. Rendering only.
pub fn to_display(p: Point, rect: &ContainRect, native_w: f64, native_h: f64) -> DisplayPoint {
    DisplayPoint {
        x: rect.offset_x + p.x * (rect.render_w / native_w),
        y: rect.offset_y + p.y * (rect.render_h / native_h),
    }
}

fn clamp_axis(v: f64, max: f64) -> f64 {
    let max = max.max(0.0);
    if v.is_nan() {
        return 0.0;
    }
    v.max(0.0).min(max)
}

/// Dimension change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionsChanged {
    pub display_w: f64,
    pub display_h: f64,
    pub native: Option<FrameSize>,
    /// `None` while not ready
    pub rect: Option<ContainRect>,
}

/// Current display surface + native resolution, with the derived content rect
pub struct Viewport {
    display_w: f64,
    display_h: f64,
    native: Option<FrameSize>,
    rect: Option<ContainRect>,
    events: broadcast::Sender<DimensionsChanged>,
}

impl Viewport {
    /// Create an empty (not ready) viewport
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            display_w: 0.0,
            display_h: 0.0,
            native: None,
            rect: None,
            events,
        }
    }

    /// Subscribe to dimension changes
    pub fn subscribe(&self) -> broadcast::Receiver<DimensionsChanged> {
        self.events.subscribe()
    }

    /// Display surface resized. Returns true if anything changed.
    pub fn resize_display(&mut self, width: f64, height: f64) -> bool {
        if self.display_w == width && self.display_h == height {
            return false;
        }
        self.display_w = width;
        self.display_h = height;
        self.recompute();
        true
    }

    /// Native resolution known/changed. Returns true if anything changed.
    pub fn set_native_size(&mut self, size: FrameSize) -> bool {
        if self.native == Some(size) {
            return false;
        }
        self.native = Some(size);
        self.recompute();
        true
    }

    pub fn native_size(&self) -> Option<FrameSize> {
        self.native
    }

    pub fn display_size(&self) -> (f64, f64) {
        (self.display_w, self.display_h)
    }

    /// Current content rectangle, `None` while not ready
    pub fn content_rect(&self) -> Option<ContainRect> {
        self.rect
    }

    pub fn is_ready(&self) -> bool {
        self.rect.is_some()
    }

    /// Display pixels per native pixel
    pub fn display_scale(&self) -> Option<f64> {
        let (rect, native) = self.rect.zip(self.native)?;
        Some(rect.render_w / native.width as f64)
    }

    pub fn to_native(&self, p: DisplayPoint) -> Option<Point> {
        let (rect, native) = self.rect.zip(self.native)?;
        Some(to_native(p, &rect, native.width as f64, native.height as f64))
    }

    pub fn to_display(&self, p: Point) -> Option<DisplayPoint> {
        let (rect, native) = self.rect.zip(self.native)?;
        Some(to_display(p, &rect, native.width as f64, native.height as f64))
    }

    fn recompute(&mut self) {
        self.rect = self.native.and_then(|n| {
            compute_contain_rect(
                self.display_w,
                self.display_h,
                n.width as f64,
                n.height as f64,
            )
        });

        tracing::debug!(
            display_w = self.display_w,
            display_h = self.display_h,
            native = ?self.native,
            ready = self.rect.is_some(),
            "Viewport dimensions changed"
        );

        // No subscribers is fine
        let _ = self.events.send(DimensionsChanged {
            display_w: self.display_w,
            display_h: self.display_h,
            native: self.native,
            rect: self.rect,
        });
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pillarbox_when_display_wider() {
        // 16:9 video in a 2000x900 surface -> 1600x900 centered
        let rect = compute_contain_rect(2000.0, 900.0, 1920.0, 1080.0).unwrap();
        assert!(approx(rect.render_h, 900.0));
        assert!(approx(rect.render_w, 1600.0));
        assert!(approx(rect.offset_x, 200.0));
        assert!(approx(rect.offset_y, 0.0));
    }

    #[test]
    fn test_letterbox_when_display_narrower() {
        // 16:9 video in an 800x800 surface -> 800x450 centered
        let rect = compute_contain_rect(800.0, 800.0, 1920.0, 1080.0).unwrap();
        assert!(approx(rect.render_w, 800.0));
        assert!(approx(rect.render_h, 450.0));
        assert!(approx(rect.offset_x, 0.0));
        assert!(approx(rect.offset_y, 175.0));
    }

    #[test]
    fn test_exact_fit_has_no_bars() {
        let rect = compute_contain_rect(640.0, 360.0, 1280.0, 720.0).unwrap();
        assert!(approx(rect.offset_x, 0.0));
        assert!(approx(rect.offset_y, 0.0));
        assert!(approx(rect.render_w, 640.0));
        assert!(approx(rect.render_h, 360.0));
    }

    #[test]
    fn test_degenerate_inputs_not_ready() {
        assert!(compute_contain_rect(800.0, 600.0, 0.0, 1080.0).is_none());
        assert!(compute_contain_rect(800.0, 600.0, 1920.0, -1.0).is_none());
        assert!(compute_contain_rect(0.0, 600.0, 1920.0, 1080.0).is_none());
        assert!(compute_contain_rect(800.0, f64::NAN, 1920.0, 1080.0).is_none());
    }

    #[test]
    fn test_to_native_clamps_clicks_in_bars() {
        let rect = compute_contain_rect(2000.0, 900.0, 1920.0, 1080.0).unwrap();
        // Click in the left pillar
        let p = to_native(DisplayPoint::new(50.0, 450.0), &rect, 1920.0, 1080.0);
        assert_eq!(p.x, 0.0);
        assert!(approx(p.y, 540.0));
        // Click in the right pillar
        let p = to_native(DisplayPoint::new(1990.0, 10.0), &rect, 1920.0, 1080.0);
        assert_eq!(p.x, 1920.0);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let native = (1920.0, 1080.0);
        let surfaces = [(2000.0, 900.0), (800.0, 800.0), (333.0, 777.0), (1920.0, 1080.0)];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1920.0, 1080.0),
            Point::new(1.0, 1.0),
            Point::new(960.5, 17.25),
            Point::new(1919.0, 3.0),
        ];

        for (dw, dh) in surfaces {
            let rect = compute_contain_rect(dw, dh, native.0, native.1).unwrap();
            for p in points {
                let d = to_display(p, &rect, native.0, native.1);
                let back = to_native(d, &rect, native.0, native.1);
                assert!((back.x - p.x).abs() <= 1.0, "x drift for {:?} on {}x{}", p, dw, dh);
                assert!((back.y - p.y).abs() <= 1.0, "y drift for {:?} on {}x{}", p, dw, dh);
            }
        }
    }

    #[test]
    fn test_viewport_not_ready_until_both_sizes_known() {
        let mut viewport = Viewport::new();
        assert!(viewport.to_native(DisplayPoint::new(1.0, 1.0)).is_none());

        viewport.resize_display(800.0, 450.0);
        assert!(!viewport.is_ready());

        viewport.set_native_size(FrameSize::new(1600, 900));
        assert!(viewport.is_ready());
        assert_eq!(viewport.display_scale(), Some(0.5));

        let p = viewport.to_native(DisplayPoint::new(400.0, 225.0)).unwrap();
        assert!(approx(p.x, 800.0));
        assert!(approx(p.y, 450.0));
    }

    #[test]
    fn test_viewport_recomputes_on_resize() {
        let mut viewport = Viewport::new();
        viewport.set_native_size(FrameSize::new(1600, 900));
        viewport.resize_display(800.0, 450.0);
        let before = viewport.to_display(Point::new(1600.0, 900.0)).unwrap();
        assert!(approx(before.x, 800.0));

        viewport.resize_display(1600.0, 900.0);
        let after = viewport.to_display(Point::new(1600.0, 900.0)).unwrap();
        assert!(approx(after.x, 1600.0));
        assert!(approx(after.y, 900.0));
    }

    #[tokio::test]
    async fn test_viewport_emits_only_on_change() {
        let mut viewport = Viewport::new();
        let mut rx = viewport.subscribe();

        assert!(viewport.resize_display(800.0, 600.0));
        let event = rx.try_recv().unwrap();
        assert!(event.rect.is_none());

        assert!(viewport.set_native_size(FrameSize::new(640, 480)));
        let event = rx.try_recv().unwrap();
        assert!(event.rect.is_some());

        // Same size again: nothing emitted
        assert!(!viewport.resize_display(800.0, 600.0));
        assert!(!viewport.set_native_size(FrameSize::new(640, 480)));
        assert!(rx.try_recv().is_err());
    }
}
