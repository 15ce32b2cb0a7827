//! The key-value contract every persistence backend implements.
//!
//! Values are opaque JSON text. Every key carries a version that starts at 1
//! on first write and grows by one on each write; a missing key reads as
//! version 0. Writers pass the version they read to get compare-and-swap.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use tracing::debug;

use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreUsage {
    pub used_bytes: u64,
    pub quota_bytes: Option<u64>,
}

impl StoreUsage {
    pub fn available(&self) -> Option<u64> {
        self.quota_bytes
            .map(|quota| quota.saturating_sub(self.used_bytes))
    }
}

/// Abstraction over persistence backends holding string values by key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, CoreError>;

    /// Writes `value` and returns the new version.
    ///
    /// With `expected_version = Some(v)` the write only happens when the
    /// current version is `v` (0 meaning "absent"); otherwise it fails with
    /// [`CoreError::Conflict`]. `None` overwrites unconditionally.
    fn put(&self, key: &str, value: &str, expected_version: Option<u64>)
        -> Result<u64, CoreError>;

    /// Removes `key`, returning whether it existed.
    fn delete(&self, key: &str) -> Result<bool, CoreError>;

    /// Keys starting with `prefix`, sorted.
    fn scan(&self, prefix: &str) -> Result<Vec<String>, CoreError>;

    fn usage(&self) -> Result<StoreUsage, CoreError>;
}

/// Bytes an entry occupies against the quota.
pub fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Checks a replacement of `previous` by `value` under `key` against the quota.
pub fn check_quota(
    key: &str,
    value: &str,
    previous: Option<&str>,
    usage: StoreUsage,
) -> Result<(), CoreError> {
    let Some(quota) = usage.quota_bytes else {
        return Ok(());
    };
    let released = previous.map(|old| entry_size(key, old)).unwrap_or(0);
    let baseline = usage.used_bytes.saturating_sub(released);
    let needed = entry_size(key, value);
    if baseline + needed > quota {
        return Err(CoreError::QuotaExceeded {
            key: key.to_string(),
            needed,
            available: quota.saturating_sub(baseline),
        });
    }
    Ok(())
}

/// Verifies the caller's expected version against the current one.
pub fn check_version(
    key: &str,
    current: Option<u64>,
    expected: Option<u64>,
) -> Result<(), CoreError> {
    match expected {
        Some(expected) if expected != current.unwrap_or(0) => Err(CoreError::Conflict {
            key: key.to_string(),
        }),
        _ => Ok(()),
    }
}

/// In-process store, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, StoredValue>>,
    quota_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredValue>>, CoreError> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))
    }

    fn used_bytes(entries: &BTreeMap<String, StoredValue>) -> u64 {
        entries
            .iter()
            .map(|(key, stored)| entry_size(key, &stored.value))
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, CoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(
        &self,
        key: &str,
        value: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, CoreError> {
        let mut entries = self.lock()?;
        let current = entries.get(key);
        check_version(key, current.map(|stored| stored.version), expected_version)?;
        let usage = StoreUsage {
            used_bytes: Self::used_bytes(&entries),
            quota_bytes: self.quota_bytes,
        };
        check_quota(key, value, current.map(|stored| stored.value.as_str()), usage)?;
        let version = current.map(|stored| stored.version).unwrap_or(0) + 1;
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                version,
            },
        );
        debug!(key, version, "memory store write");
        Ok(version)
    }

    fn delete(&self, key: &str) -> Result<bool, CoreError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn usage(&self) -> Result<StoreUsage, CoreError> {
        let entries = self.lock()?;
        Ok(StoreUsage {
            used_bytes: Self::used_bytes(&entries),
            quota_bytes: self.quota_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_start_at_one_and_increase() {
        let store = MemoryStore::new();
        assert_eq!(store.put("k", "1", None).unwrap(), 1);
        assert_eq!(store.put("k", "2", Some(1)).unwrap(), 2);
        assert_eq!(store.get("k").unwrap().unwrap().version, 2);
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let store = MemoryStore::new();
        store.put("k", "1", None).unwrap();
        let err = store.put("k", "2", Some(0)).unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
        assert_eq!(store.get("k").unwrap().unwrap().value, "1");
    }

    #[test]
    fn quota_rejects_without_changing_state() {
        let store = MemoryStore::with_quota(10);
        store.put("a", "12345", None).unwrap();
        let err = store.put("b", "123456789", None).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.get("b").unwrap().is_none());
        assert_eq!(store.usage().unwrap().used_bytes, 6);
    }

    #[test]
    fn replacing_a_value_releases_its_old_size() {
        let store = MemoryStore::with_quota(10);
        store.put("a", "123456789", None).unwrap();
        store.put("a", "987654321", None).unwrap();
        assert_eq!(store.usage().unwrap().available(), Some(0));
    }

    #[test]
    fn scan_filters_by_prefix() {
        let store = MemoryStore::new();
        store.put("config_1", "{}", None).unwrap();
        store.put("config_2", "{}", None).unwrap();
        store.put("users", "[]", None).unwrap();
        assert_eq!(store.scan("config_").unwrap(), vec!["config_1", "config_2"]);
        assert!(store.delete("users").unwrap());
        assert!(!store.delete("users").unwrap());
    }
}
