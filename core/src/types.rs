//! Comic, page, and panel records shared between the library, navigator, and reader layers.

use serde::{Deserialize, Serialize};

use crate::error::BoundsError;

/// Identifier for a comic in the library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComicId(String);

impl ComicId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for a single page image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for a panel within a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Navigation granularity used by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingMode {
    #[default]
    Page,
    Panel,
}

impl ReadingMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            ReadingMode::Page => ReadingMode::Panel,
            ReadingMode::Panel => ReadingMode::Page,
        }
    }
}

/// Rectangle expressed as fractions of the full page image.
///
/// Construction rejects non-finite values and inverted edges. Values outside `[0, 1]` are kept
/// as-is; geometry helpers extrapolate them outside the image rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds", into = "RawBounds")]
pub struct PanelBounds {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

#[derive(Serialize, Deserialize)]
struct RawBounds {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl TryFrom<RawBounds> for PanelBounds {
    type Error = BoundsError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        PanelBounds::new(raw.left, raw.top, raw.right, raw.bottom)
    }
}

impl From<PanelBounds> for RawBounds {
    fn from(bounds: PanelBounds) -> Self {
        RawBounds { left: bounds.left, top: bounds.top, right: bounds.right, bottom: bounds.bottom }
    }
}

impl PanelBounds {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, BoundsError> {
        if ![left, top, right, bottom].iter().all(|value| value.is_finite()) {
            return Err(BoundsError::NotFinite { left, top, right, bottom });
        }
        if left >= right {
            return Err(BoundsError::InvertedHorizontal { left, right });
        }
        if top >= bottom {
            return Err(BoundsError::InvertedVertical { top, bottom });
        }
        Ok(Self { left, top, right, bottom })
    }

    /// The whole page.
    pub fn full() -> Self {
        Self { left: 0.0, top: 0.0, right: 1.0, bottom: 1.0 }
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Inclusive containment test in normalized space.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// A panel region on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicPanel {
    pub id: PanelId,
    /// Back-reference to the owning page.
    pub page_id: PageId,
    /// 1-based position on the page.
    pub panel_number: u32,
    pub bounds: PanelBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reading_order: Option<u32>,
}

impl ComicPanel {
    pub fn new(id: PanelId, page_id: PageId, panel_number: u32, bounds: PanelBounds) -> Self {
        Self { id, page_id, panel_number, bounds, reading_order: None }
    }

    pub fn with_reading_order(mut self, order: u32) -> Self {
        self.reading_order = Some(order);
        self
    }

    /// Reading order, falling back to the panel number when none was assigned.
    pub fn reading_order(&self) -> u32 {
        self.reading_order.unwrap_or(self.panel_number)
    }
}

/// A single page of a comic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicPage {
    pub id: PageId,
    pub image_url: String,
    /// 1-based, informational only. Navigation uses the page's position in [`Comic::pages`].
    pub page_number: u32,
    #[serde(default)]
    pub panels: Vec<ComicPanel>,
}

impl ComicPage {
    pub fn new(id: PageId, image_url: impl Into<String>, page_number: u32) -> Self {
        Self { id, image_url: image_url.into(), page_number, panels: Vec::new() }
    }

    pub fn with_panels(mut self, panels: Vec<ComicPanel>) -> Self {
        self.panels = panels;
        self
    }
}

/// A comic with its pages and library metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub id: ComicId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image_url: String,
    pub pages: Vec<ComicPage>,
    /// 0-based index of the page the reader should open on.
    #[serde(default)]
    pub current_page: usize,
    #[serde(default)]
    pub is_downloaded: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub rating: f32,
}

impl Comic {
    pub fn new(
        id: ComicId,
        title: impl Into<String>,
        author: impl Into<String>,
        pages: Vec<ComicPage>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            description: String::new(),
            cover_image_url: String::new(),
            pages,
            current_page: 0,
            is_downloaded: false,
            is_favorite: false,
            genre: String::new(),
            publish_date: String::new(),
            rating: 0.0,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn total_panels(&self) -> usize {
        self.pages.iter().map(|page| page.panels.len()).sum()
    }

    /// Fraction of the comic read according to the stored current page, for library cards.
    pub fn reading_progress(&self) -> f32 {
        if self.pages.is_empty() {
            return 0.0;
        }
        self.current_page as f32 / self.pages.len() as f32
    }

    /// Card label such as `Page 3 of 10`, or `None` when reading has not started.
    pub fn reading_progress_label(&self) -> Option<String> {
        (self.current_page > 0)
            .then(|| format!("Page {} of {}", self.current_page, self.total_pages()))
    }
}

/// Snapshot of where the reader currently is inside a comic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPosition {
    pub reading_mode: ReadingMode,
    pub page_index: usize,
    pub panel_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_reject_inverted_edges() {
        assert!(matches!(
            PanelBounds::new(0.6, 0.0, 0.4, 1.0),
            Err(BoundsError::InvertedHorizontal { .. })
        ));
        assert!(matches!(
            PanelBounds::new(0.0, 0.5, 1.0, 0.5),
            Err(BoundsError::InvertedVertical { .. })
        ));
        assert!(matches!(
            PanelBounds::new(f32::NAN, 0.0, 1.0, 1.0),
            Err(BoundsError::NotFinite { .. })
        ));
    }

    #[test]
    fn bounds_allow_values_outside_unit_range() {
        let bounds = PanelBounds::new(-0.1, 0.0, 1.2, 1.0).expect("valid bounds");
        assert!((bounds.width() - 1.3).abs() < 1e-6);
    }

    #[test]
    fn bounds_deserialization_validates() {
        let ok: PanelBounds =
            serde_json::from_str(r#"{"left":0.1,"top":0.1,"right":0.9,"bottom":0.5}"#).unwrap();
        assert_eq!(ok.bottom(), 0.5);

        let err = serde_json::from_str::<PanelBounds>(
            r#"{"left":0.9,"top":0.1,"right":0.1,"bottom":0.5}"#,
        )
        .expect_err("inverted bounds must fail");
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn reading_order_defaults_to_panel_number() {
        let panel =
            ComicPanel::new(PanelId::new("p1"), PageId::new("page1"), 3, PanelBounds::full());
        assert_eq!(panel.reading_order(), 3);
        assert_eq!(panel.with_reading_order(1).reading_order(), 1);
    }

    #[test]
    fn progress_label_only_after_reading_started() {
        let pages = (1..=4)
            .map(|n| ComicPage::new(PageId::new(format!("page{n}")), "", n))
            .collect();
        let mut comic = Comic::new(ComicId::new("c"), "Title", "Author", pages);
        assert_eq!(comic.reading_progress_label(), None);

        comic.current_page = 2;
        assert_eq!(comic.reading_progress_label().as_deref(), Some("Page 2 of 4"));
        assert!((comic.reading_progress() - 0.5).abs() < f32::EPSILON);
    }
}
