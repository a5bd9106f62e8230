use crate::error::Result;
use crate::storage::Store;
use uuid::Uuid;

pub const PREFS_NAMESPACE: &str = "linkio_prefs";
pub const DEVICE_ID_KEY: &str = "device_id";

/// Stable anonymous identifier for this app installation.
pub struct DeviceIdentity;

impl DeviceIdentity {
    /// Return the persisted device id, creating one on first use.
    ///
    /// A freshly generated id is written with first-writer-wins semantics:
    /// if another caller persisted an id in the meantime, that id is
    /// returned and ours is discarded.
    pub fn get_or_create(store: &dyn Store) -> Result<String> {
        if let Some(existing) = store.get(PREFS_NAMESPACE, DEVICE_ID_KEY)? {
            return Ok(existing);
        }

        let candidate = Uuid::new_v4().to_string();
        let stored = store.set_if_absent(PREFS_NAMESPACE, DEVICE_ID_KEY, &candidate)?;
        if stored == candidate {
            log::debug!("Generated device id {}", stored);
        } else {
            log::debug!("Device id already persisted by a concurrent caller");
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, RedbStore};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_creates_then_reuses() {
        let store = MemoryStore::new();
        let first = DeviceIdentity::get_or_create(&store).unwrap();
        let second = DeviceIdentity::get_or_create(&store).unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_returns_existing_unchanged() {
        let store = MemoryStore::new();
        store
            .set_if_absent(PREFS_NAMESPACE, DEVICE_ID_KEY, "legacy-id")
            .unwrap();
        assert_eq!(DeviceIdentity::get_or_create(&store).unwrap(), "legacy-id");
    }

    #[test]
    fn test_concurrent_creation_converges() {
        let store = Arc::new(MemoryStore::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    DeviceIdentity::get_or_create(&*store).unwrap()
                })
            })
            .collect();

        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| id == &ids[0]));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(PREFS_NAMESPACE, DEVICE_ID_KEY).unwrap().as_ref(),
            Some(&ids[0])
        );
    }

    #[test]
    fn test_concurrent_creation_converges_on_redb() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RedbStore::open(dir.path().join("linkio.redb")).unwrap());

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || DeviceIdentity::get_or_create(&*store).unwrap())
            })
            .collect();

        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(
            store.get(PREFS_NAMESPACE, DEVICE_ID_KEY).unwrap().as_ref(),
            Some(&ids[0])
        );
    }
}
