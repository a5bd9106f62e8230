use crate::error::Result;

/// Namespaced string key-value store used for SDK persistence.
pub trait Store: Send + Sync {
    /// Read a value. `None` if the key was never written.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Write `value` only if the key is absent.
    ///
    /// Returns the value persisted after the call: `value` if this call
    /// wrote it, otherwise the existing value. Concurrent callers must all
    /// observe the same winner.
    fn set_if_absent(&self, namespace: &str, key: &str, value: &str) -> Result<String>;
}
