use super::Store;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-process store. Nothing survives a restart; useful for tests and
/// hosts that supply their own persistence later.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn set_if_absent(&self, namespace: &str, key: &str, value: &str) -> Result<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = entries
            .entry((namespace.to_string(), key.to_string()))
            .or_insert_with(|| value.to_string());
        Ok(stored.clone())
    }
}
