use super::Store;
use crate::error::{LinkIoError, Result};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

// Composite key: "<namespace>/<key>"
const KV: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// Redb-backed persistent store. One file per app installation.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LinkIoError::Storage(format!("Failed to create directory: {}", e))
            })?;
        }

        let db = Database::create(path)?;

        // Ensure the table exists so read transactions never see TableDoesNotExist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}/{}", namespace, key)
    }
}

impl Store for RedbStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV)?;
        let composite = Self::composite_key(namespace, key);

        match table.get(composite.as_str())? {
            Some(value) => Ok(Some(value.value().to_string())),
            None => Ok(None),
        }
    }

    fn set_if_absent(&self, namespace: &str, key: &str, value: &str) -> Result<String> {
        let composite = Self::composite_key(namespace, key);

        // redb serializes write transactions, so check-then-insert is atomic here.
        let write_txn = self.db.begin_write()?;
        let stored = {
            let mut table = write_txn.open_table(KV)?;
            let existing = table
                .get(composite.as_str())?
                .map(|v| v.value().to_string());
            match existing {
                Some(existing) => existing,
                None => {
                    table.insert(composite.as_str(), value)?;
                    value.to_string()
                }
            }
        };
        write_txn.commit()?;
        Ok(stored)
    }
}
