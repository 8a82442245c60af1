//! Persisted watch progress.
//!
//! [`ProgressStore`] keeps the authoritative in-memory mapping from video id to
//! [`WatchProgress`] and writes the whole mapping through a
//! [`ProgressBackend`] after every mutation. Backend failures never reach the
//! caller: reads fall back to an empty mapping and failed writes are logged
//! while the in-memory state stays authoritative for the session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::{Error, PersistenceError, Result};
use crate::playlist::WatchProgress;

/// Well-known key under which the progress blob is stored.
pub const PROGRESS_STORAGE_KEY: &str = "youtube-playlist-progress";

/// Mapping from video id to its progress record.
pub type ProgressMap = BTreeMap<String, WatchProgress>;

/// Durable storage for the progress blob.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressBackend: Send {
    /// Read the stored mapping. A missing blob is an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob exists but cannot be read or decoded.
    fn read(&self) -> Result<ProgressMap>;

    /// Replace the stored mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn write(&self, progress: &ProgressMap) -> Result<()>;
}

/// Stores the progress blob as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend at the default location.
    #[must_use]
    pub fn with_default_path() -> Self {
        Self::new(default_progress_path())
    }

    /// Location of the progress file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressBackend for JsonFileBackend {
    fn read(&self) -> Result<ProgressMap> {
        if !self.path.exists() {
            debug!("No progress file at {}", self.path.display());
            return Ok(ProgressMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::Persistence(PersistenceError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::Persistence(PersistenceError::Malformed {
                reason: e.to_string(),
            })
        })
    }

    fn write(&self, progress: &ProgressMap) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Persistence(PersistenceError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(progress)?;

        // Write beside the target and rename so a crash never leaves a torn file.
        let staging = self.path.with_extension("json.tmp");
        let write_failed = |e: std::io::Error| {
            Error::Persistence(PersistenceError::WriteFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        };
        fs::write(&staging, content).map_err(write_failed)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            if let Err(cleanup) = fs::remove_file(&staging) {
                debug!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(write_failed(e));
        }

        debug!(
            "Wrote {} progress records to {}",
            progress.len(),
            self.path.display()
        );
        Ok(())
    }
}

const MEMORY_PATH: &str = "<memory>";

/// Keeps the progress blob in memory. Clones share the same storage, which
/// makes it usable to simulate a restart in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    blob: Arc<Mutex<ProgressMap>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressBackend for MemoryBackend {
    fn read(&self) -> Result<ProgressMap> {
        self.blob
            .lock()
            .map(|blob| blob.clone())
            .map_err(|e| {
                Error::Persistence(PersistenceError::ReadFailed {
                    path: PathBuf::from(MEMORY_PATH),
                    reason: e.to_string(),
                })
            })
    }

    fn write(&self, progress: &ProgressMap) -> Result<()> {
        let mut blob = self.blob.lock().map_err(|e| {
            Error::Persistence(PersistenceError::WriteFailed {
                path: PathBuf::from(MEMORY_PATH),
                reason: e.to_string(),
            })
        })?;
        blob.clone_from(progress);
        Ok(())
    }
}

/// In-memory progress mapping backed by durable storage.
pub struct ProgressStore {
    records: ProgressMap,
    backend: Box<dyn ProgressBackend>,
    persisted: bool,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("records", &self.records.len())
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    /// Open a store, loading whatever the backend currently holds.
    pub fn open(backend: impl ProgressBackend + 'static) -> Self {
        let mut store = Self {
            records: ProgressMap::new(),
            backend: Box::new(backend),
            persisted: true,
        };
        store.records = store.load();
        info!("Loaded watch progress for {} videos", store.records.len());
        store
    }

    /// Read the persisted mapping, falling back to an empty one.
    pub fn load(&self) -> ProgressMap {
        match self.backend.read() {
            Ok(records) => normalize(records),
            Err(e) => {
                warn!("Ignoring unreadable watch progress: {}", e);
                ProgressMap::new()
            }
        }
    }

    /// Replace the whole mapping and persist it.
    pub fn save(&mut self, records: ProgressMap) {
        self.records = records;
        self.persist();
    }

    /// Progress for `video_id`, or the unwatched record if none is stored.
    #[must_use]
    pub fn get(&self, video_id: &str) -> WatchProgress {
        self.records
            .get(video_id)
            .cloned()
            .unwrap_or_else(|| WatchProgress::unwatched(video_id))
    }

    /// Whether `video_id` is marked completed.
    #[must_use]
    pub fn is_completed(&self, video_id: &str) -> bool {
        self.records.get(video_id).is_some_and(|p| p.completed)
    }

    /// Set the completed flag, keeping any recorded position.
    pub fn set_completed(&mut self, video_id: &str, completed: bool) {
        self.records
            .entry(video_id.to_string())
            .or_insert_with(|| WatchProgress::unwatched(video_id))
            .completed = completed;
        debug!("Set {} completed={}", video_id, completed);
        self.persist();
    }

    /// Record `video_id` as fully watched, resetting its position.
    pub fn mark_watched_fully(&mut self, video_id: &str) {
        self.records
            .insert(video_id.to_string(), WatchProgress::watched_fully(video_id));
        debug!("Marked {} as watched", video_id);
        self.persist();
    }

    /// Flip the completed flag and return the new value.
    pub fn toggle_completion(&mut self, video_id: &str) -> bool {
        let completed = !self.is_completed(video_id);
        self.set_completed(video_id, completed);
        completed
    }

    /// All stored records.
    #[must_use]
    pub const fn records(&self) -> &ProgressMap {
        &self.records
    }

    /// Whether the most recent write reached durable storage.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn persist(&mut self) {
        match self.backend.write(&self.records) {
            Ok(()) => {
                if !self.persisted {
                    info!("Watch progress storage available again");
                }
                self.persisted = true;
            }
            Err(e) => {
                warn!("Keeping watch progress in memory only: {}", e);
                self.persisted = false;
            }
        }
    }
}

/// Repair records whose stored id disagrees with their key and clamp
/// negative times to zero.
fn normalize(mut records: ProgressMap) -> ProgressMap {
    for (video_id, progress) in &mut records {
        if progress.video_id != *video_id {
            progress.video_id.clone_from(video_id);
        }
        progress.current_time = progress.current_time.max(0.0);
        progress.duration = progress.duration.max(0.0);
    }
    records
}

/// Default location of the progress file.
#[must_use]
pub fn default_progress_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playview")
        .join(format!("{PROGRESS_STORAGE_KEY}.json"))
}
