pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use thiserror::Error;

/// Default per-value limit, close to a browser's local-storage budget.
///
/// Quotas here count UTF-8 bytes of the stored text, not UTF-16 code units.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("value for '{key}' is {size} bytes, quota is {quota} bytes")]
    QuotaExceeded {
        key: String,
        size: usize,
        quota: usize,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("storage is unavailable")]
    Unavailable,
}

/// A synchronous string-keyed text store that survives restarts.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Return the text stored under `key`, or `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Store `value` under `key`, replacing anything already there.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Reject a value whose UTF-8 length exceeds the quota.
pub(crate) fn check_quota(key: &str, value: &str, quota: Option<usize>) -> Result<(), StoreError> {
    match quota {
        Some(quota) if value.len() > quota => Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            size: value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_quota() {
        assert!(check_quota("k", "abc", None).is_ok());
        assert!(check_quota("k", "abc", Some(3)).is_ok());

        let err = check_quota("k", "abcd", Some(3)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuotaExceeded { size: 4, quota: 3, .. }
        ));
        assert_eq!(err.to_string(), "value for 'k' is 4 bytes, quota is 3 bytes");
    }

    #[test]
    fn test_check_quota_counts_utf8_bytes() {
        // Two characters, two UTF-16 code units, six UTF-8 bytes
        let value = "\u{20AC}\u{20AC}";
        assert!(check_quota("k", value, Some(6)).is_ok());
        assert!(matches!(
            check_quota("k", value, Some(5)),
            Err(StoreError::QuotaExceeded { size: 6, quota: 5, .. })
        ));
    }

    #[test]
    fn test_arc_store_delegates() {
        let store = Arc::new(MemoryStore::new());
        store.set("shared", "1").unwrap();
        assert_eq!(store.get("shared").unwrap().as_deref(), Some("1"));
        store.remove("shared").unwrap();
        assert_eq!(store.get("shared").unwrap(), None);
    }
}
