//! Comic catalogue backing the library screens and the reader entry point.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;
use crate::config::ReaderConfig;
use crate::error::LibraryError;
use crate::reader::ReaderSession;
use crate::types::{Comic, ComicId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    comics: Vec<Comic>,
}

/// Ordered set of comics with unique ids.
///
/// Comics are shared with open sessions through `Arc`, so recording progress on a comic never
/// disturbs a navigator that is already reading it.
#[derive(Debug, Default, Clone)]
pub struct Library {
    comics: Vec<Arc<Comic>>,
}

impl Library {
    /// Build a library, rejecting duplicate ids and stored pages past the end of a comic.
    pub fn new(comics: Vec<Comic>) -> std::result::Result<Self, LibraryError> {
        let mut seen = std::collections::HashSet::with_capacity(comics.len());
        for comic in &comics {
            if !seen.insert(comic.id.as_str()) {
                return Err(LibraryError::DuplicateId(comic.id.as_str().to_string()));
            }
            // An empty comic can only sit on page 0.
            if comic.current_page >= comic.pages.len().max(1) {
                return Err(LibraryError::CurrentPageOutOfRange {
                    id: comic.id.as_str().to_string(),
                    current_page: comic.current_page,
                    page_count: comic.pages.len(),
                });
            }
        }

        Ok(Self { comics: comics.into_iter().map(Arc::new).collect() })
    }

    /// Parse a `{"comics": [...]}` document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let file: LibraryFile = serde_json::from_slice(bytes).context("parsing library json")?;
        Ok(Self::new(file.comics)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("reading library file {}", path.display()))?;
        let library = Self::from_json_slice(&bytes)
            .with_context(|| format!("loading library from {}", path.display()))?;
        info!(target: "reader", path = %path.display(), comics = library.len(), "library loaded");
        Ok(library)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        let file = LibraryFile { comics: self.comics.iter().map(|c| Comic::clone(c)).collect() };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    pub fn len(&self) -> usize {
        self.comics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comic> {
        self.comics.iter().map(|comic| comic.as_ref())
    }

    pub fn get(&self, id: &ComicId) -> std::result::Result<&Comic, LibraryError> {
        self.find(id).map(|comic| comic.as_ref())
    }

    /// Case-insensitive substring match on title, author or genre. A blank query matches all.
    pub fn search(&self, query: &str) -> Vec<&Comic> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.iter().collect();
        }

        self.iter()
            .filter(|comic| {
                [&comic.title, &comic.author, &comic.genre]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// The first `n` comics in library order.
    pub fn recent(&self, n: usize) -> Vec<&Comic> {
        self.iter().take(n).collect()
    }

    /// The `n` best-rated comics; ties keep library order.
    pub fn featured(&self, n: usize) -> Vec<&Comic> {
        let mut comics: Vec<&Comic> = self.iter().collect();
        comics.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        comics.truncate(n);
        comics
    }

    pub fn continue_reading(&self) -> Vec<&Comic> {
        self.iter().filter(|comic| comic.current_page > 0).collect()
    }

    pub fn favorites(&self) -> Vec<&Comic> {
        self.iter().filter(|comic| comic.is_favorite).collect()
    }

    pub fn set_favorite(
        &mut self,
        id: &ComicId,
        favorite: bool,
    ) -> std::result::Result<(), LibraryError> {
        Arc::make_mut(self.find_mut(id)?).is_favorite = favorite;
        Ok(())
    }

    /// Store the page a reader left off on, so the next session opens there.
    pub fn record_progress(
        &mut self,
        id: &ComicId,
        page_index: usize,
    ) -> std::result::Result<(), LibraryError> {
        let comic = self.find_mut(id)?;
        let page_count = comic.pages.len();
        if page_index >= page_count.max(1) {
            return Err(LibraryError::CurrentPageOutOfRange {
                id: id.as_str().to_string(),
                current_page: page_index,
                page_count,
            });
        }

        Arc::make_mut(comic).current_page = page_index;
        debug!(target: "reader", comic = id.as_str(), page_index, "recorded progress");
        Ok(())
    }

    /// Open a reader on `id`, starting from its stored current page.
    pub fn open_session(
        &self,
        id: &ComicId,
        config: ReaderConfig,
        now_ms: u64,
    ) -> std::result::Result<ReaderSession, LibraryError> {
        let comic = Arc::clone(self.find(id)?);
        Ok(ReaderSession::open(comic, config, now_ms))
    }

    fn find(&self, id: &ComicId) -> std::result::Result<&Arc<Comic>, LibraryError> {
        self.comics
            .iter()
            .find(|comic| comic.id == *id)
            .ok_or_else(|| LibraryError::NotFound(id.as_str().to_string()))
    }

    fn find_mut(&mut self, id: &ComicId) -> std::result::Result<&mut Arc<Comic>, LibraryError> {
        self.comics
            .iter_mut()
            .find(|comic| comic.id == *id)
            .ok_or_else(|| LibraryError::NotFound(id.as_str().to_string()))
    }
}
