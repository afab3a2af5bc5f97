//! Canvas-space highlight borders for the panels of the page being read.

use crate::config::OverlayStyle;
use crate::geometry::{Point, Rect, Size, compute_image_rect, map_panel_to_canvas};
use crate::types::ComicPanel;

/// Circle marking the current panel's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Badge {
    pub center: Point,
    pub radius: f32,
}

/// One border to draw over the page image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelHighlight {
    pub panel_index: usize,
    pub rect: Rect,
    pub highlighted: bool,
    pub alpha: f32,
    pub stroke_width: f32,
    pub badge: Option<Badge>,
}

/// Build the highlight list for `panels`.
///
/// Only the current panel is emitted unless `style.show_all_panels` is set. `highlight_alpha` is
/// the host's animated opacity for the current panel. Nothing is emitted until the image reports
/// its intrinsic size.
pub fn build_overlay(
    panels: &[ComicPanel],
    current: Option<usize>,
    canvas: Size,
    image: Size,
    style: &OverlayStyle,
    highlight_alpha: f32,
) -> Vec<PanelHighlight> {
    if image.is_degenerate() || canvas.is_degenerate() {
        return Vec::new();
    }

    let image_rect = compute_image_rect(canvas, image);
    panels
        .iter()
        .enumerate()
        .filter_map(|(index, panel)| {
            let highlighted = current == Some(index);
            if !highlighted && !style.show_all_panels {
                return None;
            }

            let rect = map_panel_to_canvas(panel, image_rect);
            let alpha = if highlighted { highlight_alpha } else { style.dimmed_alpha };
            let badge = (highlighted && alpha > style.badge_min_alpha).then(|| Badge {
                center: Point::new(rect.left + style.badge_inset, rect.top + style.badge_inset),
                radius: style.badge_radius,
            });

            Some(PanelHighlight {
                panel_index: index,
                rect,
                highlighted,
                alpha,
                stroke_width: style.stroke_width,
                badge,
            })
        })
        .collect()
}
