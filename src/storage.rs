use crate::domain::{Conference, StarSet};
use crate::error::Result;
use crate::sources::{SourceDescriptor, SourceEntry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

pub const USER_CONFERENCES: &str = "user_conferences.json";
pub const STARS: &str = "stars.json";
pub const SOURCES: &str = "sources.json";
pub const REMOTE_CONFERENCES: &str = "remote_conferences.json";
pub const BUNDLED_CONFERENCES: &str = "bundled_conferences.json";

/// Key-value blob store backing the persisted documents.
///
/// Writes replace the whole document; there is no locking between
/// concurrent processes.
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Filesystem path of a key, for stores that have one.
    fn locate(&self, _key: &str) -> Option<PathBuf> {
        None
    }
}

/// One JSON file per key inside the per-user data directory.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Storage for FsStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), key);
        Ok(())
    }

    fn locate(&self, key: &str) -> Option<PathBuf> {
        Some(self.path_for(key))
    }
}

/// In-memory storage implementation for testing
#[derive(Default)]
pub struct InMemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Typed access to the four persisted documents.
///
/// Missing or unreadable documents load as empty; a corrupt file never
/// stops the tool from starting.
pub struct Library<S: Storage> {
    storage: S,
}

impl<S: Storage> Library<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn load_document<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let bytes = match self.storage.read(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return T::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring corrupt {}: {}", key, e);
                T::default()
            }
        }
    }

    fn save_document<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.storage.write(key, &bytes)
    }

    /// Rows that fail to deserialize into a [`Conference`] are skipped.
    fn load_conferences(&self, key: &str) -> Vec<Conference> {
        let rows: Vec<Value> = self.load_document(key);
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<Conference>(row) {
                Ok(conf) => Some(conf),
                Err(e) => {
                    warn!("Skipping malformed row in {}: {}", key, e);
                    None
                }
            })
            .collect()
    }

    pub fn load_user_conferences(&self) -> Vec<Conference> {
        self.load_conferences(USER_CONFERENCES)
    }

    pub fn save_user_conferences(&self, conferences: &[Conference]) -> Result<()> {
        self.save_document(USER_CONFERENCES, conferences)
    }

    pub fn load_remote_conferences(&self) -> Vec<Conference> {
        self.load_conferences(REMOTE_CONFERENCES)
    }

    pub fn save_remote_conferences(&self, conferences: &[Conference]) -> Result<()> {
        self.save_document(REMOTE_CONFERENCES, conferences)
    }

    pub fn load_stars(&self) -> StarSet {
        self.load_document(STARS)
    }

    pub fn save_stars(&self, stars: &StarSet) -> Result<()> {
        self.save_document(STARS, stars)
    }

    /// Every row of `sources.json`, including kinds this build cannot fetch.
    pub fn load_source_entries(&self) -> Vec<SourceEntry> {
        self.load_document(SOURCES)
    }

    pub fn save_source_entries(&self, entries: &[SourceEntry]) -> Result<()> {
        self.save_document(SOURCES, entries)
    }

    /// The fetchable sources only.
    pub fn load_sources(&self) -> Vec<SourceDescriptor> {
        self.load_source_entries()
            .into_iter()
            .filter_map(|entry| match entry {
                SourceEntry::Supported(source) => Some(source),
                SourceEntry::Unsupported(_) => None,
            })
            .collect()
    }

    /// Replace the whole list.
    pub fn save_sources(&self, sources: &[SourceDescriptor]) -> Result<()> {
        self.save_document(SOURCES, sources)
    }
}
