use crate::error::StorageError;
use crate::storage::KeyValueStore;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, info, warn};

/// Durable store backed by a single JSON object file.
///
/// Reads are served from memory. Every write rewrites the whole file using
/// temp file + rename, so a crash mid-write leaves the previous file intact.
/// The in-memory entries only change once the new file is in place.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// A file that is not a JSON object of strings is moved aside to
    /// `<path>.corrupt` and the store starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| StorageError::read(&path, e))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => {
                    info!("Loaded {} stored entries from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("{}, starting with an empty store", StorageError::parse(&path, e));
                    quarantine(&path);
                    BTreeMap::new()
                }
            }
        } else {
            debug!("No store file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the entries and adopt the copy once it is
    /// on disk. `change` returns `false` when there is nothing to write.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(());
        }

        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::write(parent, e))?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(StorageError::serialize)?;

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        std::fs::write(&temp_path, json).map_err(|e| StorageError::write(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| StorageError::write(&self.path, e))?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn set_entries(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|entries| {
            for (key, value) in new_entries {
                entries.insert(key.to_string(), value.to_string());
            }
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

fn quarantine(path: &Path) {
    let mut corrupt_name = path.as_os_str().to_owned();
    corrupt_name.push(".corrupt");
    let corrupt_path = PathBuf::from(corrupt_name);

    match std::fs::rename(path, &corrupt_path) {
        Ok(()) => warn!("Moved unreadable store file to {}", corrupt_path.display()),
        Err(e) => warn!("Could not move unreadable store file {} aside: {e}", path.display()),
    }
}
