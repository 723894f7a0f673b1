//! String-valued key-value persistence.
//!
//! Stands in for the browser's local storage and cookie jar. Every write
//! replaces the stored value wholesale; the last writer wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// Keys shared by everything persisted through a [`KeyValueStore`].
pub mod keys {
    pub const CART: &str = "cart";
    pub const KEEP_LOGGED_IN: &str = "keepLoggedIn";
    pub const TOKEN: &str = "token";
    pub const REFRESH_TOKEN: &str = "refreshToken";
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write several keys together. Stores that can should make this atomic.
    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
