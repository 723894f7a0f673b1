// Unit tests for CredentialStore
// Tests the keep-logged-in durability policy

use crate::error::StorageError;
use crate::storage::keys::{KEEP_LOGGED_IN, REFRESH_TOKEN, TOKEN};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::tokens::CredentialStore;

use std::path::Path;
use std::sync::Arc;

fn credentials() -> (Arc<MemoryStore>, CredentialStore) {
    let durable = Arc::new(MemoryStore::new());
    let credentials = CredentialStore::new(Arc::clone(&durable) as Arc<dyn KeyValueStore>);
    (durable, credentials)
}

#[test]
fn given_keep_logged_in_when_saved_then_tokens_durable() {
    let (durable, credentials) = credentials();
    credentials.set_keep_logged_in(true).unwrap();

    credentials.save("access", "refresh").unwrap();

    assert_eq!(durable.get(TOKEN).as_deref(), Some("access"));
    assert_eq!(durable.get(REFRESH_TOKEN).as_deref(), Some("refresh"));
    assert_eq!(
        credentials.load(),
        Some(("access".to_string(), "refresh".to_string()))
    );
}

/// **VALUE**: Verifies tokens stay out of the durable store without keep-logged-in.
///
/// **WHY THIS MATTERS**: A user who unticks "keep me logged in" on a shared machine expects
/// the next person starting the app to see a login screen.
///
/// **BUG THIS CATCHES**: Would catch the policy being ignored and tokens always written to disk.
#[test]
fn given_no_keep_logged_in_when_saved_then_tokens_volatile_only() {
    // GIVEN: keep-logged-in explicitly off
    let (durable, credentials) = credentials();
    credentials.set_keep_logged_in(false).unwrap();

    // WHEN: Saving a pair
    credentials.save("access", "refresh").unwrap();

    // THEN: Loadable in this process, absent from the durable store
    assert!(credentials.load().is_some());
    assert!(durable.get(TOKEN).is_none());
    assert!(durable.get(REFRESH_TOKEN).is_none());
    assert_eq!(durable.get(KEEP_LOGGED_IN).as_deref(), Some("false"));
}

#[test]
fn given_policy_switched_off_when_saved_then_durable_copy_removed() {
    let (durable, credentials) = credentials();
    credentials.set_keep_logged_in(true).unwrap();
    credentials.save("old-access", "old-refresh").unwrap();

    credentials.set_keep_logged_in(false).unwrap();
    credentials.save("access", "refresh").unwrap();

    assert!(durable.get(TOKEN).is_none());
    assert_eq!(
        credentials.load(),
        Some(("access".to_string(), "refresh".to_string()))
    );
}

#[test]
fn given_no_stored_flag_when_read_then_default_policy() {
    let durable = Arc::new(MemoryStore::new());

    let default_off = CredentialStore::new(Arc::clone(&durable) as Arc<dyn KeyValueStore>);
    let default_on = CredentialStore::new(Arc::clone(&durable) as Arc<dyn KeyValueStore>)
        .with_keep_logged_in_default(true);

    assert!(!default_off.keep_logged_in());
    assert!(default_on.keep_logged_in());
}

#[test]
fn given_unreadable_flag_when_read_then_default_policy() {
    let (durable, credentials) = credentials();
    durable.set(KEEP_LOGGED_IN, "yes please").unwrap();

    assert!(!credentials.keep_logged_in());
}

#[test]
fn given_half_a_pair_when_loaded_then_ignored() {
    let (durable, credentials) = credentials();
    credentials.set_keep_logged_in(true).unwrap();
    durable.set(TOKEN, "access").unwrap();

    assert!(credentials.load().is_none());
}

#[test]
fn given_tokens_in_both_media_when_cleared_then_all_removed() {
    let (durable, credentials) = credentials();
    durable.set(TOKEN, "stale").unwrap();
    durable.set(REFRESH_TOKEN, "stale").unwrap();
    credentials.set_keep_logged_in(false).unwrap();
    credentials.save("access", "refresh").unwrap();

    credentials.clear().unwrap();

    assert!(credentials.load().is_none());
    assert!(durable.get(TOKEN).is_none());
    assert_eq!(durable.get(KEEP_LOGGED_IN).as_deref(), Some("false"));
}

/// Durable store that refuses to delete anything it holds.
struct NoDeleteStore {
    inner: MemoryStore,
}

impl KeyValueStore for NoDeleteStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.inner.get(key) {
            Some(_) => Err(StorageError::write(Path::new("state.json"), "read-only")),
            None => Ok(()),
        }
    }
}

/// **VALUE**: Verifies a save that fails halfway does not leave the new pair active.
///
/// **BUG THIS CATCHES**: Would catch the new pair staying in the active medium after the
/// old pair could not be removed, so the session and the reported error disagree.
#[test]
fn given_old_pair_cannot_be_removed_when_saved_then_new_pair_rolled_back() {
    // GIVEN: A durable pair saved with keep-logged-in, then the policy switched off
    let durable = Arc::new(NoDeleteStore {
        inner: MemoryStore::new(),
    });
    let credentials = CredentialStore::new(Arc::clone(&durable) as Arc<dyn KeyValueStore>);
    credentials.set_keep_logged_in(true).unwrap();
    credentials.save("old-access", "old-refresh").unwrap();
    credentials.set_keep_logged_in(false).unwrap();

    // WHEN: Saving a new pair, which cannot delete the durable copy
    let result = credentials.save("access", "refresh");

    // THEN: The save fails and the volatile medium holds no pair
    assert!(matches!(result, Err(StorageError::Write { .. })));
    assert!(credentials.load().is_none());
    assert_eq!(durable.get(TOKEN).as_deref(), Some("old-access"));
}
