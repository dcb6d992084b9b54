use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, warn};

use crate::models::MovieSummary;

/// Raw string persistence for the favorites blob. One key, whole-value
/// reads and writes; `load` returns `None` when nothing was ever stored.
pub trait FavoritesBackend: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, raw: &str) -> Result<()>;
}

/// Blob stored as a JSON file on disk.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FavoritesBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn store(&self, raw: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Mutex-guarded slot; what tests and embedders substitute for the file.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoritesBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        let slot = self.slot.lock().map_err(|_| anyhow!("favorites slot poisoned"))?;
        Ok(slot.clone())
    }

    fn store(&self, raw: &str) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| anyhow!("favorites slot poisoned"))?;
        *slot = Some(raw.to_string());
        Ok(())
    }
}

/// Bookmarked movies, persisted verbatim as an ordered, id-unique list.
///
/// Every operation is a whole-blob read-modify-write with no version
/// check, so concurrent writers from another process can lose an update
/// (last write wins). Single-user local storage; documented, not fixed.
pub struct FavoritesStore {
    backend: Box<dyn FavoritesBackend>,
}

impl FavoritesStore {
    pub fn new(backend: Box<dyn FavoritesBackend>) -> Self {
        Self { backend }
    }

    /// The persisted list in insertion order. A missing blob is an empty
    /// list; an unreadable or shape-mismatched blob is treated as
    /// corruption and read as empty.
    pub fn list(&self) -> Vec<MovieSummary> {
        let raw = match self.backend.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read favorites: {e:#}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<MovieSummary>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Stored favorites are corrupted, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    /// Appends `entry` unless an entry with the same id is already
    /// present. Write failures are logged and leave the stored list as it
    /// was (the write is all-or-nothing).
    pub fn add(&self, entry: MovieSummary) {
        let mut entries = self.list();
        if entries.iter().any(|fav| fav.id == entry.id) {
            return;
        }
        entries.push(entry);
        self.persist(&entries);
    }

    /// Removes the entry with `id`; no-op when absent.
    pub fn remove(&self, id: i32) {
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|fav| fav.id != id);
        if entries.len() != before {
            self.persist(&entries);
        }
    }

    pub fn contains(&self, id: i32) -> bool {
        self.list().iter().any(|fav| fav.id == id)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    fn persist(&self, entries: &[MovieSummary]) {
        let raw = match serde_json::to_string(entries) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to encode favorites: {e}");
                return;
            }
        };
        if let Err(e) = self.backend.store(&raw) {
            error!("Failed to write favorites: {e:#}");
        }
    }
}
