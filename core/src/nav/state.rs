//! Page and panel navigation state machine for a single reader session.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::types::{Comic, ComicPage, ComicPanel, NavigationPosition, ReadingMode};

use super::index::PanelIndex;

/// Callback invoked after every effective position change.
pub type PositionListener = Box<dyn FnMut(&NavigationPosition) + Send>;

/// Handle returned by [`PanelNavigator::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Observers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, PositionListener)>,
}

impl Observers {
    fn add(&mut self, listener: PositionListener) -> SubscriptionId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, position: &NavigationPosition) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(position);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("listeners", &self.listeners.len()).finish()
    }
}

/// Tracks the reading position within one comic and enforces bounds on every move.
///
/// Out-of-range requests never fail: they leave the position untouched and report `false`.
/// The comic structure is shared read-only; switching comics means building a new navigator.
#[derive(Debug)]
pub struct PanelNavigator {
    comic: Arc<Comic>,
    index: PanelIndex,
    position: NavigationPosition,
    observers: Observers,
}

impl PanelNavigator {
    /// Start a session on the comic's stored current page in page mode.
    pub fn new(comic: Arc<Comic>) -> Self {
        let page = comic.current_page;
        Self::with_position(comic, page, ReadingMode::Page)
    }

    /// Start a session on `initial_page` in `mode`. The page is clamped into range.
    pub fn with_position(comic: Arc<Comic>, initial_page: usize, mode: ReadingMode) -> Self {
        let index = PanelIndex::build(&comic);
        let last_page = comic.pages.len().saturating_sub(1);
        if initial_page > last_page {
            warn!(
                target: "nav",
                comic = %comic.id.as_str(),
                initial_page,
                page_count = comic.pages.len(),
                "initial page out of range, clamping"
            );
        }

        let position = NavigationPosition {
            reading_mode: mode,
            page_index: initial_page.min(last_page),
            panel_index: 0,
        };

        Self { comic, index, position, observers: Observers::default() }
    }

    pub fn comic(&self) -> &Arc<Comic> {
        &self.comic
    }

    pub fn panel_index_table(&self) -> &PanelIndex {
        &self.index
    }

    pub fn position(&self) -> NavigationPosition {
        self.position
    }

    pub fn reading_mode(&self) -> ReadingMode {
        self.position.reading_mode
    }

    pub fn current_page_index(&self) -> usize {
        self.position.page_index
    }

    pub fn current_panel_index(&self) -> usize {
        self.position.panel_index
    }

    pub fn page_count(&self) -> usize {
        self.comic.pages.len()
    }

    pub fn total_panels(&self) -> usize {
        self.index.total_panels()
    }

    pub fn current_page(&self) -> Option<&ComicPage> {
        self.comic.pages.get(self.position.page_index)
    }

    pub fn current_panel(&self) -> Option<&ComicPanel> {
        self.current_page().and_then(|page| page.panels.get(self.position.panel_index))
    }

    /// Global rank of the current panel, or 0 when the current page has no panels.
    pub fn current_global_panel_index(&self) -> usize {
        self.index.global_index(self.position.page_index, self.position.panel_index).unwrap_or(0)
    }

    /// Register an observer called after each effective position change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&NavigationPosition) + Send + 'static,
    {
        self.observers.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    pub fn toggle_reading_mode(&mut self) {
        let mode = self.position.reading_mode.toggled();
        self.set_reading_mode(mode);
    }

    /// Switch modes. Entering page mode resets the panel index to 0.
    pub fn set_reading_mode(&mut self, mode: ReadingMode) {
        let mut next = self.position;
        next.reading_mode = mode;
        if mode == ReadingMode::Page {
            next.panel_index = 0;
        }
        self.apply(next, "set_reading_mode");
    }

    /// Jump to `page_index`, resetting the panel index. Returns whether the request was accepted.
    pub fn go_to_page(&mut self, page_index: usize) -> bool {
        if page_index >= self.page_count() {
            trace!(target: "nav", page_index, page_count = self.page_count(), "go_to_page ignored");
            return false;
        }
        self.apply(
            NavigationPosition { page_index, panel_index: 0, ..self.position },
            "go_to_page",
        );
        true
    }

    /// Jump to a specific panel. Returns whether the request was accepted.
    pub fn go_to_panel(&mut self, page_index: usize, panel_index: usize) -> bool {
        if page_index >= self.page_count() || panel_index >= self.index.panel_count(page_index) {
            trace!(target: "nav", page_index, panel_index, "go_to_panel ignored");
            return false;
        }
        self.apply(NavigationPosition { page_index, panel_index, ..self.position }, "go_to_panel");
        true
    }

    /// Reapply a previously saved position. Returns false, leaving the position untouched, when
    /// it no longer fits the comic. Page-mode positions always land on panel 0.
    pub fn restore(&mut self, saved: NavigationPosition) -> bool {
        let panel_index =
            if saved.reading_mode == ReadingMode::Page { 0 } else { saved.panel_index };
        let panel_fits = panel_index == 0 || panel_index < self.index.panel_count(saved.page_index);
        if saved.page_index >= self.page_count() || !panel_fits {
            warn!(target: "nav", ?saved, "saved position does not fit comic, ignoring");
            return false;
        }

        self.apply(NavigationPosition { panel_index, ..saved }, "restore");
        true
    }

    /// Advance one panel, crossing to the next page that has panels. Panel mode only.
    pub fn next_panel(&mut self) -> bool {
        if self.position.reading_mode != ReadingMode::Panel {
            return false;
        }

        let page = self.position.page_index;
        let on_page = self.index.panel_count(page);
        if self.position.panel_index + 1 < on_page {
            return self.apply(
                NavigationPosition { panel_index: self.position.panel_index + 1, ..self.position },
                "next_panel",
            );
        }

        match self.index.next_page_with_panels(page) {
            Some(next_page) => self.apply(
                NavigationPosition { page_index: next_page, panel_index: 0, ..self.position },
                "next_panel",
            ),
            None => false,
        }
    }

    /// Step back one panel, crossing to the last panel of the previous page that has panels.
    pub fn previous_panel(&mut self) -> bool {
        if self.position.reading_mode != ReadingMode::Panel {
            return false;
        }

        if self.position.panel_index > 0 {
            return self.apply(
                NavigationPosition { panel_index: self.position.panel_index - 1, ..self.position },
                "previous_panel",
            );
        }

        match self.index.previous_page_with_panels(self.position.page_index) {
            Some(previous_page) => {
                let last_panel = self.index.panel_count(previous_page) - 1;
                self.apply(
                    NavigationPosition {
                        page_index: previous_page,
                        panel_index: last_panel,
                        ..self.position
                    },
                    "previous_panel",
                )
            }
            None => false,
        }
    }

    pub fn next_page(&mut self) -> bool {
        let page = self.position.page_index;
        if page + 1 >= self.page_count() {
            return false;
        }
        self.apply(
            NavigationPosition { page_index: page + 1, panel_index: 0, ..self.position },
            "next_page",
        )
    }

    pub fn previous_page(&mut self) -> bool {
        let page = self.position.page_index;
        if page == 0 {
            return false;
        }
        self.apply(
            NavigationPosition { page_index: page - 1, panel_index: 0, ..self.position },
            "previous_page",
        )
    }

    pub fn can_go_next(&self) -> bool {
        let NavigationPosition { reading_mode, page_index, panel_index } = self.position;
        let more_pages = page_index + 1 < self.page_count();
        match reading_mode {
            ReadingMode::Page => more_pages,
            ReadingMode::Panel => {
                self.current_page().is_some()
                    && (panel_index + 1 < self.index.panel_count(page_index) || more_pages)
            }
        }
    }

    pub fn can_go_previous(&self) -> bool {
        let NavigationPosition { reading_mode, page_index, panel_index } = self.position;
        match reading_mode {
            ReadingMode::Page => page_index > 0,
            ReadingMode::Panel => page_index > 0 || panel_index > 0,
        }
    }

    /// Reading progress in `[0, 1]` for the active mode.
    pub fn progress_percentage(&self) -> f32 {
        match self.position.reading_mode {
            ReadingMode::Page => {
                if self.page_count() == 0 {
                    return 0.0;
                }
                (self.position.page_index + 1) as f32 / self.page_count() as f32
            }
            ReadingMode::Panel => {
                let total = self.total_panels();
                if total == 0 {
                    return 0.0;
                }
                (self.current_global_panel_index() + 1) as f32 / total as f32
            }
        }
    }

    /// Progress label such as `Page 2 of 10` or `Panel 1/4 • Page 2/10`.
    pub fn progress_text(&self) -> String {
        let page_count = self.page_count();
        let page_number = if page_count == 0 { 0 } else { self.position.page_index + 1 };
        let page_text = format!("Page {page_number} of {page_count}");

        match self.position.reading_mode {
            ReadingMode::Page => page_text,
            ReadingMode::Panel => {
                let on_page = self.index.panel_count(self.position.page_index);
                if on_page == 0 {
                    return page_text;
                }
                format!(
                    "Panel {}/{on_page} \u{2022} Page {page_number}/{page_count}",
                    self.position.panel_index + 1
                )
            }
        }
    }

    /// Store `next` and notify observers when it differs from the current position.
    fn apply(&mut self, next: NavigationPosition, operation: &'static str) -> bool {
        if next == self.position {
            return false;
        }

        debug!(
            target: "nav",
            operation,
            comic = %self.comic.id.as_str(),
            mode = ?next.reading_mode,
            page = next.page_index,
            panel = next.panel_index,
            "position changed"
        );
        self.position = next;
        self.observers.notify(&next);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::{ComicId, ComicPage, ComicPanel, PageId, PanelBounds, PanelId};

    fn comic(panels_per_page: &[usize]) -> Arc<Comic> {
        let pages = panels_per_page
            .iter()
            .enumerate()
            .map(|(p, &count)| {
                let page_id = PageId::new(format!("page{p}"));
                let panels = (0..count)
                    .map(|n| {
                        ComicPanel::new(
                            PanelId::new(format!("p{p}-{n}")),
                            page_id.clone(),
                            n as u32 + 1,
                            PanelBounds::full(),
                        )
                    })
                    .collect();
                ComicPage::new(page_id, format!("https://example.test/{p}.png"), p as u32 + 1)
                    .with_panels(panels)
            })
            .collect();
        Arc::new(Comic::new(ComicId::new("comic"), "Title", "Author", pages))
    }

    fn panel_mode(panels_per_page: &[usize]) -> PanelNavigator {
        PanelNavigator::with_position(comic(panels_per_page), 0, ReadingMode::Panel)
    }

    #[test]
    fn seeds_from_stored_current_page() {
        let mut stored = (*comic(&[1, 1, 1])).clone();
        stored.current_page = 2;
        let nav = PanelNavigator::new(Arc::new(stored));
        assert_eq!(nav.current_page_index(), 2);
        assert_eq!(nav.reading_mode(), ReadingMode::Page);
    }

    #[test]
    fn clamps_out_of_range_seed() {
        let nav = PanelNavigator::with_position(comic(&[1, 1]), 9, ReadingMode::Page);
        assert_eq!(nav.current_page_index(), 1);
    }

    #[test]
    fn go_to_page_resets_panel_and_rejects_out_of_range() {
        let mut nav = panel_mode(&[3, 3, 3]);
        assert!(nav.go_to_panel(1, 2));

        for page in 0..3 {
            assert!(nav.go_to_page(page));
            assert_eq!(nav.current_page_index(), page);
            assert_eq!(nav.current_panel_index(), 0);
        }

        let before = nav.position();
        assert!(!nav.go_to_page(3));
        assert!(!nav.go_to_page(usize::MAX));
        assert_eq!(nav.position(), before);
    }

    #[test]
    fn go_to_panel_checks_page_and_panel_bounds() {
        let mut nav = panel_mode(&[2, 0]);
        assert!(!nav.go_to_panel(0, 2));
        assert!(!nav.go_to_panel(1, 0));
        assert!(!nav.go_to_panel(2, 0));
        assert!(nav.go_to_panel(0, 1));
        assert_eq!(nav.current_panel_index(), 1);
    }

    #[test]
    fn next_panel_walks_every_panel_then_stops() {
        let mut nav = panel_mode(&[2, 3, 1]);
        let total = nav.total_panels();
        for _ in 0..total - 1 {
            assert!(nav.next_panel());
        }
        assert_eq!(nav.current_page_index(), 2);
        assert_eq!(nav.current_panel_index(), 0);

        let before = nav.position();
        assert!(!nav.next_panel());
        assert_eq!(nav.position(), before);
    }

    #[test]
    fn panel_traversal_skips_pages_without_panels() {
        let mut nav = panel_mode(&[1, 0, 2]);
        assert!(nav.next_panel());
        assert_eq!((nav.current_page_index(), nav.current_panel_index()), (2, 0));
        assert!(nav.previous_panel());
        assert_eq!((nav.current_page_index(), nav.current_panel_index()), (0, 0));
    }

    #[test]
    fn previous_panel_inverts_next_panel() {
        let mut nav = panel_mode(&[2, 0, 3, 1]);
        let reachable: Vec<_> = nav
            .panel_index_table()
            .locations()
            .iter()
            .map(|loc| (loc.page_index, loc.panel_index_in_page))
            .collect();

        for (page, panel) in reachable {
            assert!(nav.go_to_panel(page, panel));
            let before = nav.position();
            if nav.next_panel() {
                assert!(nav.previous_panel());
                assert_eq!(nav.position(), before);
            }
        }
    }

    #[test]
    fn previous_panel_lands_on_last_panel_of_previous_page() {
        let mut nav = panel_mode(&[3, 2]);
        assert!(nav.go_to_panel(1, 0));
        assert!(nav.previous_panel());
        assert_eq!((nav.current_page_index(), nav.current_panel_index()), (0, 2));
        assert!(nav.go_to_panel(0, 0));
        assert!(!nav.previous_panel());
    }

    #[test]
    fn panel_moves_require_panel_mode() {
        let mut nav = PanelNavigator::with_position(comic(&[3]), 0, ReadingMode::Page);
        assert!(!nav.next_panel());
        assert!(!nav.previous_panel());
        assert_eq!(nav.current_panel_index(), 0);
    }

    #[test]
    fn page_moves_work_in_any_mode() {
        let mut nav = panel_mode(&[2, 2]);
        assert!(nav.next_panel());
        assert!(nav.next_page());
        assert_eq!((nav.current_page_index(), nav.current_panel_index()), (1, 0));
        assert!(!nav.next_page());
        assert!(nav.previous_page());
        assert!(!nav.previous_page());
    }

    #[test]
    fn switching_to_page_mode_resets_panel() {
        let mut nav = panel_mode(&[4]);
        assert!(nav.go_to_panel(0, 3));
        nav.set_reading_mode(ReadingMode::Page);
        assert_eq!(nav.current_panel_index(), 0);

        nav.toggle_reading_mode();
        assert_eq!(nav.reading_mode(), ReadingMode::Panel);
        assert!(nav.go_to_panel(0, 2));
        nav.toggle_reading_mode();
        assert_eq!(nav.reading_mode(), ReadingMode::Page);
        assert_eq!(nav.current_panel_index(), 0);
    }

    #[test]
    fn boundary_predicates_follow_mode() {
        let mut nav = PanelNavigator::with_position(comic(&[2, 1]), 0, ReadingMode::Page);
        assert!(nav.can_go_next());
        assert!(!nav.can_go_previous());
        assert!(nav.next_page());
        assert!(!nav.can_go_next());

        nav.set_reading_mode(ReadingMode::Panel);
        assert!(nav.can_go_previous());
        assert!(!nav.can_go_next());

        assert!(nav.go_to_panel(0, 0));
        assert!(nav.can_go_next());
        assert!(!nav.can_go_previous());
        assert!(nav.next_panel());
        assert!(nav.can_go_previous());
    }

    #[test]
    fn page_progress_hits_exact_endpoints() {
        let mut nav = PanelNavigator::with_position(comic(&[0, 0, 0, 0]), 0, ReadingMode::Page);
        assert_eq!(nav.progress_percentage(), 1.0 / 4.0);
        assert!(nav.go_to_page(3));
        assert_eq!(nav.progress_percentage(), 1.0);
        assert_eq!(nav.progress_text(), "Page 4 of 4");
    }

    #[test]
    fn panel_progress_uses_global_index() {
        let mut nav = panel_mode(&[2, 2]);
        assert!(nav.go_to_panel(1, 0));
        assert_eq!(nav.current_global_panel_index(), 2);
        assert!((nav.progress_percentage() - 0.75).abs() < f32::EPSILON);
        assert_eq!(nav.progress_text(), "Panel 1/2 \u{2022} Page 2/2");

        let empty = panel_mode(&[0, 0]);
        assert_eq!(empty.progress_percentage(), 0.0);
        assert_eq!(empty.progress_text(), "Page 1 of 2");
    }

    #[test]
    fn observers_see_only_effective_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut nav = panel_mode(&[2, 1]);
        let sink = Arc::clone(&seen);
        let id = nav.subscribe(move |position| sink.lock().unwrap().push(*position));

        assert!(nav.next_panel());
        assert!(!nav.go_to_page(7));
        assert!(nav.go_to_panel(0, 1));
        nav.set_reading_mode(ReadingMode::Panel);
        assert!(nav.next_page());

        assert!(nav.unsubscribe(id));
        assert!(!nav.unsubscribe(id));
        assert!(nav.previous_page());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].panel_index, 1);
        assert_eq!(seen[1].page_index, 1);
    }

    #[test]
    fn restore_validates_saved_position() {
        let mut nav = PanelNavigator::with_position(comic(&[1, 3]), 0, ReadingMode::Page);
        let saved =
            NavigationPosition { reading_mode: ReadingMode::Panel, page_index: 1, panel_index: 2 };
        assert!(nav.restore(saved));
        assert_eq!(nav.position(), saved);

        let stale = NavigationPosition { panel_index: 5, ..saved };
        assert!(!nav.restore(stale));
        assert_eq!(nav.position(), saved);

        let page_mode = NavigationPosition { reading_mode: ReadingMode::Page, ..saved };
        assert!(nav.restore(page_mode));
        assert_eq!(nav.current_panel_index(), 0);
    }

    #[test]
    fn empty_comic_is_inert() {
        let mut nav = PanelNavigator::new(comic(&[]));
        assert!(!nav.next_page());
        assert!(!nav.go_to_page(0));
        assert!(!nav.can_go_next());
        assert_eq!(nav.progress_percentage(), 0.0);
        assert_eq!(nav.progress_text(), "Page 0 of 0");
        nav.set_reading_mode(ReadingMode::Panel);
        assert!(!nav.next_panel());
        assert!(!nav.can_go_next());
    }
}
