//! One open comic: navigator, chrome visibility, zoom, and tap dispatch.

use std::sync::Arc;

use tracing::debug;

use crate::config::ReaderConfig;
use crate::geometry::{Point, Size, find_panel_at_point};
use crate::nav::PanelNavigator;
use crate::overlay::{PanelHighlight, build_overlay};
use crate::types::{Comic, NavigationPosition, ReadingMode};

use super::chrome::{ChromeVisibility, HideDeadline, HideToken};
use super::zoom::ZoomState;

/// What a tap on the page did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Panel mode: the tap landed on a panel of the current page.
    PanelSelected { page_index: usize, panel_index: usize },
    /// Page mode: the tap hit a side zone. `moved` is false at the first/last page.
    PageTurned { forward: bool, moved: bool },
    ChromeToggled { visible: bool },
}

/// Reader state for a single comic, driven by discrete UI events.
///
/// All methods take the caller's clock in milliseconds so the session stays deterministic.
#[derive(Debug)]
pub struct ReaderSession {
    navigator: PanelNavigator,
    config: ReaderConfig,
    chrome: ChromeVisibility,
    zoom: ZoomState,
}

impl ReaderSession {
    /// Open `comic` on its stored current page in the configured initial reading mode.
    pub fn open(comic: Arc<Comic>, config: ReaderConfig, now_ms: u64) -> Self {
        let initial_page = comic.current_page;
        let navigator =
            PanelNavigator::with_position(comic, initial_page, config.initial_reading_mode);
        let chrome = ChromeVisibility::new(config.auto_hide_ms, now_ms);
        let zoom = ZoomState::new(config.zoom);
        debug!(
            target: "reader",
            comic = %navigator.comic().id.as_str(),
            page = navigator.current_page_index(),
            mode = ?navigator.reading_mode(),
            "session opened"
        );
        Self { navigator, config, chrome, zoom }
    }

    pub fn navigator(&self) -> &PanelNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut PanelNavigator {
        &mut self.navigator
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn position(&self) -> NavigationPosition {
        self.navigator.position()
    }

    pub fn chrome_visible(&self) -> bool {
        self.chrome.is_visible()
    }

    pub fn pending_hide(&self) -> Option<HideDeadline> {
        self.chrome.pending()
    }

    pub fn toggle_chrome(&mut self, now_ms: u64) -> bool {
        self.chrome.toggle(now_ms)
    }

    pub fn set_chrome_visible(&mut self, visible: bool, now_ms: u64) {
        self.chrome.set_visible(visible, now_ms);
    }

    /// Poll the auto-hide deadline. Returns true when the chrome was hidden by this call.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.chrome.tick(now_ms)
    }

    /// Timer callback for hosts that schedule the deadline themselves.
    pub fn fire_hide(&mut self, token: HideToken) -> bool {
        self.chrome.fire(token)
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn apply_zoom_gesture(&mut self, zoom_change: f32, pan: Point) {
        self.zoom.apply_gesture(zoom_change, pan);
    }

    /// Dispatch a tap on the page canvas.
    ///
    /// Panel mode hit-tests the current page (taps are mapped back through the zoom transform
    /// first) and toggles the chrome on a miss. Page mode turns pages from the side zones and
    /// toggles the chrome from the middle.
    pub fn handle_tap(
        &mut self,
        tap: Point,
        canvas: Size,
        image: Size,
        now_ms: u64,
    ) -> TapOutcome {
        match self.navigator.reading_mode() {
            ReadingMode::Panel => {
                let page_index = self.navigator.current_page_index();
                let content_tap = self.zoom.to_content(tap, canvas);
                let hit = self
                    .navigator
                    .current_page()
                    .filter(|page| !page.panels.is_empty())
                    .and_then(|page| find_panel_at_point(&page.panels, content_tap, canvas, image));

                match hit {
                    Some(panel_index) if self.navigator.go_to_panel(page_index, panel_index) => {
                        TapOutcome::PanelSelected { page_index, panel_index }
                    }
                    _ => TapOutcome::ChromeToggled { visible: self.chrome.toggle(now_ms) },
                }
            }
            ReadingMode::Page => {
                let zones = self.config.tap_zones;
                if tap.x < canvas.width * zones.previous_fraction {
                    TapOutcome::PageTurned { forward: false, moved: self.navigator.previous_page() }
                } else if tap.x > canvas.width * zones.next_fraction {
                    TapOutcome::PageTurned { forward: true, moved: self.navigator.next_page() }
                } else {
                    TapOutcome::ChromeToggled { visible: self.chrome.toggle(now_ms) }
                }
            }
        }
    }

    /// "Next" button: a page or a panel depending on the mode.
    pub fn step_forward(&mut self) -> bool {
        match self.navigator.reading_mode() {
            ReadingMode::Page => self.navigator.next_page(),
            ReadingMode::Panel => self.navigator.next_panel(),
        }
    }

    /// "Previous" button: a page or a panel depending on the mode.
    pub fn step_backward(&mut self) -> bool {
        match self.navigator.reading_mode() {
            ReadingMode::Page => self.navigator.previous_page(),
            ReadingMode::Panel => self.navigator.previous_panel(),
        }
    }

    pub fn forward_enabled(&self) -> bool {
        self.navigator.can_go_next()
    }

    pub fn backward_enabled(&self) -> bool {
        self.navigator.can_go_previous()
    }

    pub fn toggle_reading_mode(&mut self) {
        self.navigator.toggle_reading_mode();
    }

    /// The external pager settled on `page_index`. Applied only when it differs from the
    /// navigator, so pager echoes of navigator-driven scrolls do not reset the panel index.
    pub fn sync_pager(&mut self, page_index: usize) -> bool {
        if page_index == self.navigator.current_page_index() {
            return false;
        }
        self.navigator.go_to_page(page_index)
    }

    pub fn progress(&self) -> (f32, String) {
        (self.navigator.progress_percentage(), self.navigator.progress_text())
    }

    pub fn mode_label(&self) -> &'static str {
        match self.navigator.reading_mode() {
            ReadingMode::Page => "Page Reading Mode",
            ReadingMode::Panel => "Panel Reading Mode",
        }
    }

    /// Labels for the (previous, next) buttons.
    pub fn step_labels(&self) -> (&'static str, &'static str) {
        match self.navigator.reading_mode() {
            ReadingMode::Page => ("Previous", "Next"),
            ReadingMode::Panel => ("Prev Panel", "Next Panel"),
        }
    }

    /// Highlights for the current page, drawn only in panel mode on pages that have panels.
    pub fn highlights(
        &self,
        canvas: Size,
        image: Size,
        highlight_alpha: f32,
    ) -> Vec<PanelHighlight> {
        if self.navigator.reading_mode() != ReadingMode::Panel {
            return Vec::new();
        }
        let Some(page) = self.navigator.current_page() else {
            return Vec::new();
        };

        build_overlay(
            &page.panels,
            Some(self.navigator.current_panel_index()),
            canvas,
            image,
            &self.config.overlay,
            highlight_alpha,
        )
    }
}
