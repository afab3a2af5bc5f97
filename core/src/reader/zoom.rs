//! Pinch-zoom and pan transform applied to the page image and its panel overlay.

use tracing::{trace, warn};

use crate::config::ZoomLimits;
use crate::geometry::{Point, Size};

/// Scale about the canvas centre followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    scale: f32,
    offset: Point,
    limits: ZoomLimits,
}

impl ZoomState {
    /// Unusable limits (swapped, non-positive or non-finite) are normalized first.
    pub fn new(limits: ZoomLimits) -> Self {
        let normalized = limits.normalized();
        if normalized != limits {
            warn!(target: "reader", ?limits, ?normalized, "zoom limits adjusted");
        }
        Self { scale: normalized.min_scale, offset: Point::ZERO, limits: normalized }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Apply one transform gesture. Panning only accumulates while zoomed in.
    ///
    /// A non-finite or non-positive `zoom_change` drops the whole gesture; a non-finite pan is
    /// treated as no pan.
    pub fn apply_gesture(&mut self, zoom_change: f32, pan: Point) {
        if !zoom_change.is_finite() || zoom_change <= 0.0 {
            trace!(target: "reader", zoom_change, "ignoring malformed zoom gesture");
            return;
        }
        let pan = if pan.x.is_finite() && pan.y.is_finite() { pan } else { Point::ZERO };

        self.scale = (self.scale * zoom_change).clamp(self.limits.min_scale, self.limits.max_scale);
        self.offset = if self.scale > 1.0 { self.offset + pan } else { Point::ZERO };
    }

    pub fn reset(&mut self) {
        self.scale = self.limits.min_scale;
        self.offset = Point::ZERO;
    }

    /// Map a point on screen back into untransformed canvas coordinates.
    pub fn to_content(&self, screen: Point, canvas: Size) -> Point {
        let cx = canvas.width / 2.0;
        let cy = canvas.height / 2.0;
        Point::new(
            (screen.x - self.offset.x - cx) / self.scale + cx,
            (screen.y - self.offset.y - cy) / self.scale + cy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_clamped_and_pan_resets_at_rest() {
        let mut zoom = ZoomState::new(ZoomLimits::default());
        zoom.apply_gesture(1.0, Point::new(40.0, 0.0));
        assert_eq!(zoom.offset(), Point::ZERO);

        zoom.apply_gesture(10.0, Point::new(40.0, 10.0));
        assert_eq!(zoom.scale(), 5.0);
        assert_eq!(zoom.offset(), Point::new(40.0, 10.0));

        zoom.apply_gesture(0.01, Point::new(5.0, 5.0));
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.offset(), Point::ZERO);
    }

    #[test]
    fn swapped_limits_do_not_panic() {
        let mut zoom = ZoomState::new(ZoomLimits { min_scale: 5.0, max_scale: 1.0 });
        assert_eq!(zoom.scale(), 1.0);

        zoom.apply_gesture(2.0, Point::ZERO);
        assert_eq!(zoom.scale(), 2.0);
        zoom.apply_gesture(10.0, Point::ZERO);
        assert_eq!(zoom.scale(), 5.0);
    }

    #[test]
    fn malformed_gestures_leave_state_untouched() {
        let mut zoom = ZoomState::new(ZoomLimits::default());
        zoom.apply_gesture(2.0, Point::new(10.0, 20.0));

        for change in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.0, -1.0] {
            zoom.apply_gesture(change, Point::new(5.0, 5.0));
            assert_eq!(zoom.scale(), 2.0);
            assert_eq!(zoom.offset(), Point::new(10.0, 20.0));
        }

        zoom.apply_gesture(1.5, Point::new(f32::NAN, 1.0));
        assert_eq!(zoom.scale(), 3.0);
        assert_eq!(zoom.offset(), Point::new(10.0, 20.0));

        let canvas = Size::new(800.0, 1200.0);
        let content = zoom.to_content(Point::new(400.0, 600.0), canvas);
        assert!(content.x.is_finite() && content.y.is_finite());
    }

    #[test]
    fn to_content_inverts_the_transform() {
        let canvas = Size::new(800.0, 1200.0);
        let mut zoom = ZoomState::new(ZoomLimits::default());
        assert_eq!(zoom.to_content(Point::new(123.0, 456.0), canvas), Point::new(123.0, 456.0));

        zoom.apply_gesture(2.0, Point::new(100.0, 0.0));
        // Centre of the canvas is drawn at centre + offset.
        let content = zoom.to_content(Point::new(500.0, 600.0), canvas);
        assert!((content.x - 400.0).abs() < 1e-3);
        assert!((content.y - 600.0).abs() < 1e-3);

        zoom.reset();
        assert_eq!(zoom.scale(), 1.0);
    }
}
