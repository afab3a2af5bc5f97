//! Reading core for the comic reader: panel navigation, contain-fit hit-testing and the state a
//! reader screen needs around them.

#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod library;
pub mod log;
pub mod nav;
pub mod overlay;
pub mod reader;
pub mod store;
pub mod types;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub use config::ReaderConfig;
pub use error::{BoundsError, LibraryError};
pub use geometry::{Point, Rect, Size, compute_image_rect, find_panel_at_point};
pub use library::Library;
pub use nav::{PanelNavigator, SharedNavigator};
pub use reader::{ReaderSession, TapOutcome};
pub use store::ProgressStore;
pub use types::{
    Comic, ComicId, ComicPage, ComicPanel, NavigationPosition, PageId, PanelBounds, PanelId,
    ReadingMode,
};

/// Returns the version of the core crate for telemetry and debugging.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_semver_version() {
        assert!(version().contains('.'));
    }

    #[test]
    fn constructs_basic_types() {
        let page = ComicPage::new(PageId::new("p1"), "page1.jpg", 1).with_panels(vec![
            ComicPanel::new(PanelId::new("p1-1"), PageId::new("p1"), 1, PanelBounds::full()),
        ]);
        let comic = Comic::new(ComicId::new("demo"), "Demo", "Anon", vec![page]);

        assert_eq!(comic.total_panels(), 1);
        assert_eq!(PanelNavigator::new(comic.into()).reading_mode(), ReadingMode::Page);
    }
}
