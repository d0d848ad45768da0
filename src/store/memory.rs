use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{Batch, LocalStore};

/// In-memory [`LocalStore`]. State is lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| anyhow!("memory store lock poisoned: {e}"))
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn apply(&self, batch: Batch) -> Result<()> {
        let mut entries = self.lock()?;
        for key in &batch.remove {
            entries.remove(key);
        }
        for (key, value) in batch.set {
            entries.insert(key, value);
        }
        Ok(())
    }

    fn set_unless_present(&self, guard: &str, key: &str, value: &str) -> Result<bool> {
        let mut entries = self.lock()?;
        if entries.contains_key(guard) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
