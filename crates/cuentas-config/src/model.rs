use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Browser localStorage gives an origin about five megabytes.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_BACKUP_RETENTION: usize = 5;
pub const DEFAULT_LOG_FILTER: &str = "cuentas=info";

/// Stores user-configurable CLI preferences and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// `None` disables the store quota.
    #[serde(default = "Config::default_quota_bytes")]
    pub quota_bytes: Option<u64>,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    #[serde(default = "Config::default_color")]
    pub color: bool,
    /// Username last signed in, offered as a hint at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to `<base>/data`.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "es-AR".into(),
            currency: "ARS".into(),
            quota_bytes: Self::default_quota_bytes(),
            backup_retention: Self::default_backup_retention(),
            log_filter: Self::default_log_filter(),
            color: Self::default_color(),
            last_user: None,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_quota_bytes() -> Option<u64> {
        Some(DEFAULT_QUOTA_BYTES)
    }

    pub fn default_backup_retention() -> usize {
        DEFAULT_BACKUP_RETENTION
    }

    pub fn default_log_filter() -> String {
        DEFAULT_LOG_FILTER.into()
    }

    pub fn default_color() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(path) => path.clone(),
            None => base.join("data"),
        }
    }

    /// Keys accepted by [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "locale",
        "currency",
        "quota_bytes",
        "backup_retention",
        "log_filter",
        "color",
        "data_dir",
    ];

    /// Updates one field from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match key {
            "locale" => self.locale = value.to_string(),
            "currency" => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid("expected a three-letter currency code"));
                }
                self.currency = value.to_ascii_uppercase();
            }
            "quota_bytes" => {
                self.quota_bytes = match value {
                    "none" | "off" => None,
                    raw => Some(raw.parse().map_err(|_| invalid("expected a byte count or `none`"))?),
                }
            }
            "backup_retention" => {
                let retention: usize = value
                    .parse()
                    .map_err(|_| invalid("expected a positive number"))?;
                if retention == 0 {
                    return Err(invalid("expected a positive number"));
                }
                self.backup_retention = retention;
            }
            "log_filter" => self.log_filter = value.to_string(),
            "color" => {
                self.color = match value {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    _ => return Err(invalid("expected on or off")),
                }
            }
            "data_dir" => {
                self.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => {
                return Err(invalid(&format!(
                    "unknown key (expected one of: {})",
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}
