use std::{
    cmp::Reverse,
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cuentas_core::CoreError;

use crate::{write_atomic, Envelope, JsonFileStore, ENTRY_EXTENSION};

const BACKUP_PREFIX: &str = "store";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// A snapshot file under `backups/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// File name, e.g. `store_20240709_1830_antes-de-migrar.json`.
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    created_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Writes every key into one timestamped snapshot and prunes old ones.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let _guard = self.guard()?;
        let now = Utc::now();
        let snapshot = Snapshot {
            created_at: now,
            entries: self
                .read_all()?
                .into_iter()
                .map(|(key, envelope)| (key, envelope.value))
                .collect(),
        };
        let mut stem = format!("{BACKUP_PREFIX}_{}", now.format(BACKUP_TIMESTAMP_FORMAT));
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let id = format!("{stem}.{ENTRY_EXTENSION}");
        let path = self.backups_dir.join(&id);
        write_atomic(&path, &serde_json::to_string_pretty(&snapshot)?)?;
        info!(backup = %id, keys = snapshot.entries.len(), "backup written");
        self.prune_backups()?;
        Ok(BackupInfo {
            created_at: parse_backup_timestamp(&id),
            size_bytes: fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0),
            id,
            path,
        })
    }

    /// Newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        let mut entries = Vec::new();
        if !self.backups_dir.exists() {
            return Ok(entries);
        }
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !id.starts_with(BACKUP_PREFIX) {
                continue;
            }
            entries.push(BackupInfo {
                id: id.to_string(),
                created_at: parse_backup_timestamp(id),
                size_bytes: fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0),
                path: path.clone(),
            });
        }
        entries.sort_by_key(|info| (Reverse(info.created_at), Reverse(info.id.clone())));
        Ok(entries)
    }

    /// Replaces every key with the snapshot's contents. Keys absent from the
    /// snapshot are removed; versions keep increasing.
    pub fn restore(&self, backup_id: &str) -> Result<usize, CoreError> {
        let path = self.backups_dir.join(backup_id);
        if backup_id.contains(['/', '\\']) || !path.exists() {
            return Err(CoreError::not_found("Backup", backup_id));
        }
        let snapshot: Snapshot = serde_json::from_str(&fs::read_to_string(&path)?)?;

        let _guard = self.guard()?;
        let existing = self.read_all()?;
        for (key, _) in &existing {
            if !snapshot.entries.contains_key(key) {
                fs::remove_file(self.entry_path(key))?;
            }
        }
        let versions: BTreeMap<&str, u64> = existing
            .iter()
            .map(|(key, envelope)| (key.as_str(), envelope.version))
            .collect();
        let now = Utc::now();
        for (key, value) in &snapshot.entries {
            let version = versions.get(key.as_str()).copied().unwrap_or(0) + 1;
            self.write_envelope(
                key,
                &Envelope {
                    version,
                    updated_at: now,
                    value: value.clone(),
                },
            )?;
        }
        info!(backup = %backup_id, keys = snapshot.entries.len(), "backup restored");
        Ok(snapshot.entries.len())
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(stale.path);
        }
        Ok(())
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_backup_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let rest = id.strip_prefix(BACKUP_PREFIX)?.strip_prefix('_')?;
    let raw = rest.get(..13)?;
    NaiveDateTime::parse_from_str(raw, BACKUP_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("  Antes de migrar!! v2.0 ")).as_deref(),
            Some("antes-de-migrar-v2-0")
        );
        assert_eq!(sanitize_backup_note(Some("???")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }

    #[test]
    fn timestamps_parse_with_and_without_note() {
        let plain = parse_backup_timestamp("store_20240709_1830.json").unwrap();
        assert_eq!((plain.year(), plain.month(), plain.day()), (2024, 7, 9));
        assert_eq!((plain.hour(), plain.minute()), (18, 30));
        assert_eq!(
            parse_backup_timestamp("store_20240709_1830_nota.json"),
            Some(plain)
        );
        assert_eq!(parse_backup_timestamp("other_20240709_1830.json"), None);
    }
}
