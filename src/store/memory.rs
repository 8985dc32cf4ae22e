use super::{KeyValueStore, StoreError, check_quota};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                quota: Some(quota),
                ..Inner::default()
            }),
        }
    }

    /// Seed an entry without counting it as a write.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make every operation fail, like storage disabled by the host.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a consistent map
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        check_quota(key, value, self.inner.quota)?;
        self.entries().insert(key.to_string(), value.to_string());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_shared_between_clones() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("slot", "value").unwrap();
        assert_eq!(other.get("slot").unwrap().as_deref(), Some("value"));
        assert_eq!(other.writes(), 1);
    }

    #[test]
    fn test_memory_store_insert_is_not_a_write() {
        let store = MemoryStore::new();
        store.insert("slot", "seeded");
        assert_eq!(store.writes(), 0);
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("seeded"));
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(matches!(store.get("slot"), Err(StoreError::Unavailable)));
        assert!(matches!(store.set("slot", "v"), Err(StoreError::Unavailable)));
        assert_eq!(store.writes(), 0);

        store.set_unavailable(false);
        assert!(store.set("slot", "v").is_ok());
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(2);
        assert!(store.set("slot", "ab").is_ok());
        assert!(matches!(
            store.set("slot", "abc"),
            Err(StoreError::QuotaExceeded { .. })
        ));
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("ab"));
        assert_eq!(store.writes(), 1);
    }
}
