//! Contain-fit geometry and tap-to-panel hit-testing.
//!
//! Page images are drawn scaled to fit inside the reader canvas while preserving their aspect
//! ratio, which leaves letterbox bars above and below (wide images) or pillarbox bars on the sides
//! (tall images). Panel bounds are stored as fractions of the full image, so every conversion
//! between canvas pixels and panel space goes through the image rectangle computed here.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{ComicPanel, PanelBounds};

/// Width and height in canvas or image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True until both dimensions are strictly positive and finite.
    ///
    /// Image sizes stay at zero until the external decoder reports intrinsic dimensions.
    pub fn is_degenerate(&self) -> bool {
        let finite = self.width.is_finite() && self.height.is_finite();
        !(finite && self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// A position in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, width: right - left, height: bottom - top }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point { x: self.left + self.width / 2.0, y: self.top + self.height / 2.0 }
    }

    /// Half-open containment: the left/top edges are inside, the right/bottom edges are not.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }
}

/// Compute the part of `canvas` covered by an image of `image` intrinsic size under contain-fit.
///
/// `image` must be non-degenerate; see [`Size::is_degenerate`].
pub fn compute_image_rect(canvas: Size, image: Size) -> Rect {
    let canvas_aspect = canvas.aspect_ratio();
    let image_aspect = image.aspect_ratio();

    if image_aspect > canvas_aspect {
        // Relatively wider than the canvas: fit to width, letterbox vertically.
        let height = canvas.width / image_aspect;
        let offset_y = (canvas.height - height) / 2.0;
        Rect::new(0.0, offset_y, canvas.width, height)
    } else {
        let width = canvas.height * image_aspect;
        let offset_x = (canvas.width - width) / 2.0;
        Rect::new(offset_x, 0.0, width, canvas.height)
    }
}

/// Project normalized bounds onto `image_rect`. No clamping is applied.
pub fn map_bounds_to_canvas(bounds: &PanelBounds, image_rect: Rect) -> Rect {
    Rect::from_edges(
        image_rect.left + bounds.left() * image_rect.width,
        image_rect.top + bounds.top() * image_rect.height,
        image_rect.left + bounds.right() * image_rect.width,
        image_rect.top + bounds.bottom() * image_rect.height,
    )
}

/// Canvas-space rectangle for a panel, used to draw its highlight border.
pub fn map_panel_to_canvas(panel: &ComicPanel, image_rect: Rect) -> Rect {
    map_bounds_to_canvas(&panel.bounds, image_rect)
}

/// Convert a canvas point into normalized image space, or `None` if it misses the image.
pub fn normalize_point(tap: Point, canvas: Size, image: Size) -> Option<(f32, f32)> {
    if image.is_degenerate() || canvas.is_degenerate() {
        return None;
    }

    let image_rect = compute_image_rect(canvas, image);
    if !image_rect.contains(tap) {
        return None;
    }

    let rel_x = (tap.x - image_rect.left) / image_rect.width;
    let rel_y = (tap.y - image_rect.top) / image_rect.height;
    Some((rel_x, rel_y))
}

/// Index of the first panel in `panels` whose bounds contain `tap`.
///
/// List order is the tie-break for overlapping panels, so callers pass panels in hit priority
/// order (usually reading order). Returns `None` while `image` is still degenerate, when the tap
/// lands in the letterbox area, or when no panel contains it.
pub fn find_panel_at_point(
    panels: &[ComicPanel],
    tap: Point,
    canvas: Size,
    image: Size,
) -> Option<usize> {
    let Some((rel_x, rel_y)) = normalize_point(tap, canvas, image) else {
        trace!(target: "geometry", ?tap, ?canvas, ?image, "tap outside image or image not ready");
        return None;
    };

    let hit = panels.iter().position(|panel| panel.bounds.contains(rel_x, rel_y));
    trace!(target: "geometry", rel_x, rel_y, ?hit, "resolved tap");
    hit
}
