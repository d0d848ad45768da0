//! Process-wide key-value store shared by every page.
//!
//! This is the client's only shared mutable state: the credential, the user
//! profile, and the guest-only snapshots all live here. [`LocalStore`] has an
//! on-disk SQLite implementation ([`SqliteStore`]) and an in-memory one
//! ([`MemoryStore`]) for tests.

pub mod memory;
pub mod sqlite;

use anyhow::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persisted key names.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const HOME_SNAPSHOT: &str = "home_snapshot";
    pub const DASHBOARD_SNAPSHOT: &str = "dashboard_snapshot";
    pub const CHAT_MESSAGES: &str = "chat_messages";

    /// Every key the client persists. Cleared together on each session transition.
    pub const ALL: &[&str] = &[TOKEN, USER, HOME_SNAPSHOT, DASHBOARD_SNAPSHOT, CHAT_MESSAGES];
}

/// A set of removals and writes applied as one unit.
///
/// Removals are applied before writes, so a key that appears in both ends up
/// holding the written value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Batch {
    pub remove: Vec<String>,
    pub set: Vec<(String, String)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.remove.push(key.to_string());
        self
    }

    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set.push((key.to_string(), value.into()));
        self
    }
}

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Apply a batch atomically: readers see either none or all of it.
    fn apply(&self, batch: Batch) -> Result<()>;

    /// Write `key` only if `guard` is absent, checked and written as one
    /// atomic step. Returns whether the write happened.
    fn set_unless_present(&self, guard: &str, key: &str, value: &str) -> Result<bool>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Clear every persisted key and write `sets`, atomically.
///
/// Used for every session transition (login, signup, logout, guest, 401).
pub fn session_transition(store: &dyn LocalStore, sets: &[(&str, String)]) -> Result<()> {
    let mut batch = keys::ALL.iter().fold(Batch::new(), |b, key| b.remove(key));
    for (key, value) in sets {
        batch = batch.set(key, value.clone());
    }
    store.apply(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_clears_every_key_then_writes() {
        let store = MemoryStore::new();
        for key in keys::ALL {
            store.set(key, "stale").unwrap();
        }
        store.set("unrelated", "kept").unwrap();

        session_transition(&store, &[(keys::TOKEN, "fresh".to_string())]).unwrap();

        assert_eq!(store.get(keys::TOKEN).unwrap().as_deref(), Some("fresh"));
        for key in &keys::ALL[1..] {
            assert!(store.get(key).unwrap().is_none(), "{key} should be cleared");
        }
        assert_eq!(store.get("unrelated").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn guarded_write_skips_when_guard_present() {
        let store = MemoryStore::new();
        assert!(store.set_unless_present(keys::TOKEN, keys::HOME_SNAPSHOT, "{}").unwrap());

        store.set(keys::TOKEN, "t").unwrap();
        assert!(!store.set_unless_present(keys::TOKEN, keys::HOME_SNAPSHOT, "new").unwrap());
        assert_eq!(store.get(keys::HOME_SNAPSHOT).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn batch_sets_win_over_removes() {
        let store = MemoryStore::new();
        store.apply(Batch::new().remove("a").set("a", "1")).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }
}
