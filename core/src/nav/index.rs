//! Cross-page panel ordering computed once per comic.

use crate::types::{Comic, PanelId};

/// Where a panel sits within the comic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLocation {
    pub panel_id: PanelId,
    pub page_index: usize,
    pub panel_index_in_page: usize,
    /// Rank in the whole-comic reading order.
    pub global_index: usize,
}

/// Flattened panel list plus per-page offsets into it.
#[derive(Debug, Clone, Default)]
pub struct PanelIndex {
    locations: Vec<PanelLocation>,
    /// `page_offsets[p]` is the number of panels on pages strictly before `p`.
    page_offsets: Vec<usize>,
    panel_counts: Vec<usize>,
}

impl PanelIndex {
    pub fn build(comic: &Comic) -> Self {
        let mut locations = Vec::with_capacity(comic.total_panels());
        let mut page_offsets = Vec::with_capacity(comic.pages.len());
        let mut panel_counts = Vec::with_capacity(comic.pages.len());

        for (page_index, page) in comic.pages.iter().enumerate() {
            let offset = locations.len();
            page_offsets.push(offset);
            panel_counts.push(page.panels.len());
            locations.extend(page.panels.iter().enumerate().map(|(panel_index, panel)| {
                PanelLocation {
                    panel_id: panel.id.clone(),
                    page_index,
                    panel_index_in_page: panel_index,
                    global_index: offset + panel_index,
                }
            }));
        }

        Self { locations, page_offsets, panel_counts }
    }

    pub fn total_panels(&self) -> usize {
        self.locations.len()
    }

    pub fn page_count(&self) -> usize {
        self.panel_counts.len()
    }

    pub fn locations(&self) -> &[PanelLocation] {
        &self.locations
    }

    /// Panels on the given page, zero for out-of-range pages.
    pub fn panel_count(&self, page_index: usize) -> usize {
        self.panel_counts.get(page_index).copied().unwrap_or(0)
    }

    pub fn global_index(&self, page_index: usize, panel_index: usize) -> Option<usize> {
        if panel_index >= self.panel_count(page_index) {
            return None;
        }
        self.page_offsets.get(page_index).map(|offset| offset + panel_index)
    }

    pub fn location(&self, global_index: usize) -> Option<&PanelLocation> {
        self.locations.get(global_index)
    }

    /// First page after `page_index` that has at least one panel.
    pub fn next_page_with_panels(&self, page_index: usize) -> Option<usize> {
        (page_index + 1..self.page_count()).find(|&page| self.panel_count(page) > 0)
    }

    /// Last page before `page_index` that has at least one panel.
    pub fn previous_page_with_panels(&self, page_index: usize) -> Option<usize> {
        (0..page_index.min(self.page_count())).rev().find(|&page| self.panel_count(page) > 0)
    }
}
