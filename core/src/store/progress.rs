//! Persistent reading positions, one per comic.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::Result;
use crate::types::{ComicId, NavigationPosition};

const APP_QUALIFIER: &str = "com";
const APP_ORGANISATION: &str = "ComicReader";
const APP_NAME: &str = "comic-reader";

/// JSON file of saved positions keyed by comic id.
///
/// Every operation reads the file fresh and rewrites it through a temp file in the same
/// directory, so a crash mid-write leaves the previous contents intact. The mutex serialises
/// callers sharing one store.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    entries: HashMap<String, ProgressEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressEntry {
    #[serde(flatten)]
    position: NavigationPosition,
    updated_ms: u64,
}

impl ProgressStore {
    /// Store backed by `progress.json` under the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dir = ProjectDirs::from(APP_QUALIFIER, APP_ORGANISATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("state"))
            .ok_or_else(|| anyhow!("unable to resolve application data directory"))?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating progress directory at {}", dir.display()))?;
        Ok(Self::at(dir.join("progress.json")))
    }

    /// Store backed by an explicit file. The file is created on first save.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, comic: &ComicId) -> Result<Option<NavigationPosition>> {
        let _guard = self.lock.lock();
        let file = self.read_file()?;
        Ok(file.entries.get(comic.as_str()).map(|entry| entry.position))
    }

    pub fn save(&self, comic: &ComicId, position: NavigationPosition) -> Result<()> {
        self.save_at(comic, position, now_ms())
    }

    fn save_at(
        &self,
        comic: &ComicId,
        position: NavigationPosition,
        updated_ms: u64,
    ) -> Result<()> {
        let _guard = self.lock.lock();
        let mut file = self.read_file()?;
        file.entries.insert(comic.as_str().to_string(), ProgressEntry { position, updated_ms });
        self.write_file(&file)?;
        debug!(target: "store::progress", comic = comic.as_str(), ?position, "saved position");
        Ok(())
    }

    /// Drop the saved position for `comic`. Returns whether one existed.
    pub fn forget(&self, comic: &ComicId) -> Result<bool> {
        let _guard = self.lock.lock();
        let mut file = self.read_file()?;
        if file.entries.remove(comic.as_str()).is_none() {
            return Ok(false);
        }
        self.write_file(&file)?;
        Ok(true)
    }

    /// Comic ids with a saved position, most recently updated first.
    pub fn recent(&self) -> Result<Vec<ComicId>> {
        let _guard = self.lock.lock();
        let file = self.read_file()?;
        let mut entries: Vec<_> = file.entries.into_iter().collect();
        entries.sort_by(|(a_id, a), (b_id, b)| {
            b.updated_ms.cmp(&a.updated_ms).then_with(|| a_id.cmp(b_id))
        });
        Ok(entries.into_iter().map(|(id, _)| ComicId::new(id)).collect())
    }

    fn read_file(&self) -> Result<ProgressFile> {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(file) => Ok(file),
                Err(err) => {
                    warn!(
                        target: "store::progress",
                        path = %self.path.display(),
                        error = %err,
                        "progress file unreadable, starting fresh"
                    );
                    Ok(ProgressFile::default())
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ProgressFile::default()),
            Err(err) => Err(err)
                .with_context(|| format!("reading progress file {}", self.path.display())),
        }
    }

    fn write_file(&self, file: &ProgressFile) -> Result<()> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty()).ok_or_else(|| {
            anyhow!("progress path {} does not have a parent directory", self.path.display())
        })?;
        fs::create_dir_all(parent)?;

        let data = serde_json::to_vec_pretty(file)?;
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&data)?;
        temp.flush()?;

        match temp.persist(&self.path) {
            Ok(_) => Ok(()),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                if let Err(remove_err) = fs::remove_file(&self.path) {
                    if remove_err.kind() != io::ErrorKind::NotFound {
                        return Err(remove_err.into());
                    }
                }
                err.file.persist(&self.path).map(|_| ()).map_err(|persist| persist.error.into())
            }
            Err(err) => Err(err.error.into()),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReadingMode;

    fn position(page_index: usize, panel_index: usize) -> NavigationPosition {
        NavigationPosition { reading_mode: ReadingMode::Panel, page_index, panel_index }
    }

    #[test]
    fn writes_and_reads_positions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::at(dir.path().join("state").join("progress.json"));
        let comic = ComicId::new("1");

        assert_eq!(store.load(&comic).unwrap(), None);
        store.save(&comic, position(4, 2)).unwrap();
        store.save(&comic, position(5, 0)).unwrap();
        assert_eq!(store.load(&comic).unwrap(), Some(position(5, 0)));

        let reopened = ProgressStore::at(store.path());
        assert_eq!(reopened.load(&comic).unwrap(), Some(position(5, 0)));
    }

    #[test]
    fn forget_removes_only_that_comic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::at(dir.path().join("progress.json"));
        store.save(&ComicId::new("a"), position(1, 0)).unwrap();
        store.save(&ComicId::new("b"), position(2, 0)).unwrap();

        assert!(store.forget(&ComicId::new("a")).unwrap());
        assert!(!store.forget(&ComicId::new("a")).unwrap());
        assert_eq!(store.load(&ComicId::new("a")).unwrap(), None);
        assert_eq!(store.load(&ComicId::new("b")).unwrap(), Some(position(2, 0)));
    }

    #[test]
    fn recent_lists_latest_saves_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::at(dir.path().join("progress.json"));
        assert!(store.recent().unwrap().is_empty());

        store.save_at(&ComicId::new("old"), position(0, 0), 100).unwrap();
        store.save_at(&ComicId::new("b"), position(1, 0), 300).unwrap();
        store.save_at(&ComicId::new("a"), position(2, 0), 300).unwrap();
        store.save_at(&ComicId::new("mid"), position(3, 0), 200).unwrap();

        let ids: Vec<_> =
            store.recent().unwrap().iter().map(|id| id.as_str().to_owned()).collect();
        assert_eq!(ids, ["a", "b", "mid", "old"]);

        store.save_at(&ComicId::new("old"), position(1, 0), 400).unwrap();
        assert_eq!(store.recent().unwrap()[0], ComicId::new("old"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("progress.json");
        fs::write(&path, b"{not json").unwrap();

        let store = ProgressStore::at(&path);
        assert_eq!(store.load(&ComicId::new("a")).unwrap(), None);
        store.save(&ComicId::new("a"), position(0, 1)).unwrap();
        assert_eq!(store.load(&ComicId::new("a")).unwrap(), Some(position(0, 1)));
    }
}
