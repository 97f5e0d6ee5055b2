use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::KeyValueStore;

/// In-process store for tests and embedding. Reads and writes can be made to fail
/// to exercise the persistence error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    failing_keys: Mutex<HashSet<String>>,
    fail_all_writes: AtomicBool,
    fail_reads: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_all_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, key: &str) {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.insert(key.to_string());
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn entries(&self) -> io::Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))
    }

    fn write_blocked(&self, key: &str) -> bool {
        self.fail_all_writes.load(Ordering::SeqCst)
            || self
                .failing_keys
                .lock()
                .map(|keys| keys.contains(key))
                .unwrap_or(true)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::other(format!("simulated read failure for '{key}'")));
        }
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        if self.write_blocked(key) {
            return Err(io::Error::other(format!("simulated write failure for '{key}'")));
        }
        self.entries()?.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_returns_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.expect("get"), None);
        store.set("k", "v").await.expect("set");
        assert_eq!(store.get("k").await.expect("get").as_deref(), Some("v"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_io_errors() {
        let store = MemoryStore::new().with_entry("a", "1");
        store.fail_writes_for("b");
        store.set("a", "2").await.expect("a is writable");
        assert!(store.set("b", "2").await.is_err());
        assert_eq!(store.raw("b"), None);

        store.set_fail_reads(true);
        assert!(store.get("a").await.is_err());
        store.set_fail_reads(false);
        assert_eq!(store.get("a").await.expect("get").as_deref(), Some("2"));

        store.set_fail_writes(true);
        assert!(store.set("a", "3").await.is_err());
        assert_eq!(store.raw("a").as_deref(), Some("2"));
    }
}
