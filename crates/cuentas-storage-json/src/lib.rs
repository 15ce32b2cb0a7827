//! Filesystem-backed key-value store. Each key lives in its own JSON
//! envelope under `store/`; snapshots of every key go to `backups/`.

mod backup;

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cuentas_core::{
    store::{check_quota, check_version, entry_size},
    CoreError, KeyValueStore, StoreUsage, StoredValue,
};

pub use backup::BackupInfo;

const ENTRY_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    version: u64,
    updated_at: DateTime<Utc>,
    value: String,
}

/// Key-value store over a directory tree.
///
/// All read-check-write sequences run under one mutex, so threads sharing a
/// store see compare-and-swap semantics. Separate processes are only
/// coordinated through the version check.
#[derive(Debug)]
pub struct JsonFileStore {
    store_dir: PathBuf,
    backups_dir: PathBuf,
    quota_bytes: Option<u64>,
    retention: usize,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(root: impl AsRef<Path>, quota_bytes: Option<u64>) -> Result<Self, CoreError> {
        Self::with_retention(root, quota_bytes, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        root: impl AsRef<Path>,
        quota_bytes: Option<u64>,
        retention: usize,
    ) -> Result<Self, CoreError> {
        let root = root.as_ref();
        let store_dir = root.join("store");
        let backups_dir = root.join("backups");
        fs::create_dir_all(&store_dir)?;
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            store_dir,
            backups_dir,
            quota_bytes,
            retention: retention.max(1),
            lock: Mutex::new(()),
        })
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.store_dir
            .join(format!("{}.{}", escape_key(key), ENTRY_EXTENSION))
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.lock
            .lock()
            .map_err(|_| CoreError::Storage("store lock poisoned".into()))
    }

    fn read_envelope(&self, key: &str) -> Result<Option<Envelope>, CoreError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let envelope = serde_json::from_str(&data).map_err(|err| {
            CoreError::Storage(format!("corrupt entry `{}`: {err}", path.display()))
        })?;
        Ok(Some(envelope))
    }

    fn write_envelope(&self, key: &str, envelope: &Envelope) -> Result<(), CoreError> {
        let path = self.entry_path(key);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &serde_json::to_string_pretty(envelope)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Every stored key with its current value.
    fn read_all(&self) -> Result<Vec<(String, Envelope)>, CoreError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.store_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(unescape_key)
            else {
                warn!(path = %path.display(), "skipping file with unreadable key");
                continue;
            };
            if let Some(envelope) = self.read_envelope(&key)? {
                entries.push((key, envelope));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn current_usage(&self) -> Result<StoreUsage, CoreError> {
        let used_bytes = self
            .read_all()?
            .iter()
            .map(|(key, envelope)| entry_size(key, &envelope.value))
            .sum();
        Ok(StoreUsage {
            used_bytes,
            quota_bytes: self.quota_bytes,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, CoreError> {
        let _guard = self.guard()?;
        Ok(self.read_envelope(key)?.map(|envelope| StoredValue {
            value: envelope.value,
            version: envelope.version,
        }))
    }

    fn put(
        &self,
        key: &str,
        value: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, CoreError> {
        let _guard = self.guard()?;
        let current = self.read_envelope(key)?;
        check_version(key, current.as_ref().map(|env| env.version), expected_version)?;
        if self.quota_bytes.is_some() {
            let usage = self.current_usage()?;
            check_quota(key, value, current.as_ref().map(|env| env.value.as_str()), usage)?;
        }
        let version = current.map(|env| env.version).unwrap_or(0) + 1;
        self.write_envelope(
            key,
            &Envelope {
                version,
                updated_at: Utc::now(),
                value: value.to_string(),
            },
        )?;
        debug!(key, version, "stored entry");
        Ok(version)
    }

    fn delete(&self, key: &str) -> Result<bool, CoreError> {
        let _guard = self.guard()?;
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        debug!(key, "deleted entry");
        Ok(true)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let _guard = self.guard()?;
        Ok(self
            .read_all()?
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    fn usage(&self) -> Result<StoreUsage, CoreError> {
        let _guard = self.guard()?;
        self.current_usage()
    }
}

/// `[A-Za-z0-9_-]` pass through; every other byte becomes `%XX`.
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => escaped.push(byte as char),
            other => escaped.push_str(&format!("%{other:02X}")),
        }
    }
    escaped
}

pub fn unescape_key(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let hex = escaped.get(index + 1..index + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            index += 3;
        } else {
            out.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_escape_reversibly() {
        for key in ["transactions", "config_1712345678901", "a/b c%", "señal"] {
            let escaped = escape_key(key);
            assert!(escaped
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '%')));
            assert_eq!(unescape_key(&escaped).as_deref(), Some(key));
        }
        assert_eq!(escape_key("a.b"), "a%2Eb");
    }

    #[test]
    fn truncated_escapes_are_rejected() {
        assert_eq!(unescape_key("abc%4"), None);
        assert_eq!(unescape_key("%ZZ"), None);
    }
}
