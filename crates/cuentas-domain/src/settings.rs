use serde::{Deserialize, Serialize};

use crate::common::EntityId;

pub const DEFAULT_CURRENCY: &str = "ARS";

/// Per-profile preferences, stored under `config_<userId>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub user_id: EntityId,
    #[serde(default)]
    pub live_with_others: bool,
    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Free-text names, not references to `Person` records.
    #[serde(default)]
    pub people: Vec<String>,
}

impl Settings {
    pub fn defaults_for(user_id: EntityId) -> Self {
        Self {
            user_id,
            live_with_others: false,
            dark_mode: default_dark_mode(),
            currency: default_currency(),
            people: Vec::new(),
        }
    }

    pub fn storage_key(user_id: &EntityId) -> String {
        format!("config_{}", user_id)
    }

    pub fn has_person(&self, name: &str) -> bool {
        self.people.iter().any(|person| person == name.trim())
    }
}

fn default_dark_mode() -> bool {
    true
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_fields_from_defaults() {
        // Freshly registered profiles only carry these two keys.
        let json = r#"{"userId":"42","liveWithOthers":false}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.currency, "ARS");
        assert!(settings.dark_mode);
        assert!(settings.people.is_empty());
    }

    #[test]
    fn storage_key_embeds_user_id() {
        assert_eq!(Settings::storage_key(&"abc".into()), "config_abc");
    }
}
