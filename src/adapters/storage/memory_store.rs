use dashmap::DashMap;

use crate::ports::{LocalStore, LocalStoreResult};

/// Process-lifetime storage for `--ephemeral` sessions and tests.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: DashMap<String, String>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> LocalStoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
