//! Token persistence with a keep-logged-in durability policy.
//!
//! With keep-logged-in set, tokens go to the durable store and survive a
//! restart. Without it they live in a process-local store, the equivalent of
//! a browser session cookie. The flag itself is always durable.

use crate::error::StorageError;
use crate::storage::keys::{KEEP_LOGGED_IN, REFRESH_TOKEN, TOKEN};
use crate::storage::{KeyValueStore, MemoryStore};

use std::sync::Arc;

use log::{debug, warn};

pub struct CredentialStore {
    durable: Arc<dyn KeyValueStore>,
    volatile: MemoryStore,
    keep_logged_in_default: bool,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable,
            volatile: MemoryStore::new(),
            keep_logged_in_default: false,
        }
    }

    /// Policy used while no keep-logged-in flag has been stored yet.
    pub fn with_keep_logged_in_default(mut self, keep_logged_in: bool) -> Self {
        self.keep_logged_in_default = keep_logged_in;
        self
    }

    pub fn keep_logged_in(&self) -> bool {
        match self.durable.get(KEEP_LOGGED_IN).as_deref() {
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                warn!("Ignoring unreadable {KEEP_LOGGED_IN} value '{other}'");
                self.keep_logged_in_default
            }
            None => self.keep_logged_in_default,
        }
    }

    pub fn set_keep_logged_in(&self, keep_logged_in: bool) -> Result<(), StorageError> {
        self.durable
            .set(KEEP_LOGGED_IN, if keep_logged_in { "true" } else { "false" })
    }

    fn active(&self) -> (&dyn KeyValueStore, &dyn KeyValueStore) {
        if self.keep_logged_in() {
            (self.durable.as_ref(), &self.volatile)
        } else {
            (&self.volatile, self.durable.as_ref())
        }
    }

    /// Stored `(access, refresh)` pair, if both halves are present.
    pub fn load(&self) -> Option<(String, String)> {
        let (active, _) = self.active();
        match (active.get(TOKEN), active.get(REFRESH_TOKEN)) {
            (Some(access), Some(refresh)) => Some((access, refresh)),
            (None, None) => None,
            _ => {
                warn!("Found only one half of the stored token pair, ignoring it");
                None
            }
        }
    }

    /// Write both tokens to the medium the current policy selects.
    ///
    /// On error the previously stored pair is put back.
    pub fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), StorageError> {
        let (active, inactive) = self.active();
        let previous = (active.get(TOKEN), active.get(REFRESH_TOKEN));
        active.set_entries(&[(TOKEN, access_token), (REFRESH_TOKEN, refresh_token)])?;

        // A policy switch must not leave an older pair behind in the other medium
        let cleared = inactive
            .remove(TOKEN)
            .and_then(|()| inactive.remove(REFRESH_TOKEN));
        if let Err(e) = cleared {
            restore(active, previous);
            return Err(e);
        }

        debug!("Stored token pair (keep logged in: {})", self.keep_logged_in());
        Ok(())
    }

    /// Remove both tokens from both media.
    ///
    /// Every removal is attempted; the first failure is reported.
    pub fn clear(&self) -> Result<(), StorageError> {
        let results = [
            self.volatile.remove(TOKEN),
            self.volatile.remove(REFRESH_TOKEN),
            self.durable.remove(TOKEN),
            self.durable.remove(REFRESH_TOKEN),
        ];
        results.into_iter().collect()
    }
}

fn restore(store: &dyn KeyValueStore, previous: (Option<String>, Option<String>)) {
    let restored = match previous {
        (Some(access), Some(refresh)) => {
            store.set_entries(&[(TOKEN, access.as_str()), (REFRESH_TOKEN, refresh.as_str())])
        }
        _ => store
            .remove(TOKEN)
            .and_then(|()| store.remove(REFRESH_TOKEN)),
    };
    if let Err(e) = restored {
        warn!("Could not restore the previous token pair: {e}");
    }
}
