//! Shared identifiers, traits, and enums for finance records.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque record identifier.
///
/// New identifiers are random UUID v4 strings. Records written by older
/// versions carried millisecond timestamps (`"1712345678901"`) or fixed seeds
/// (`"cat_1"`); those still deserialize since the id is kept as text.
/// The default id is empty and matches no profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exposes a stable identifier for stored records.
pub trait Identifiable {
    fn id(&self) -> &EntityId;
}

/// Records that belong to a single profile.
pub trait Owned {
    fn user_id(&self) -> &EntityId;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Direction of money flow. Serialized as `"income"` / `"expense"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "ingreso" => Some(TransactionKind::Income),
            "expense" | "gasto" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        };
        f.write_str(label)
    }
}

/// Serde helpers for `YYYY-MM-DD` dates that also accept full ISO timestamps.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid date `{raw}`")))
    }
}

/// Parses `YYYY-MM-DD`, ignoring any trailing time component.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ids_deserialize() {
        let id: EntityId = serde_json::from_str("\"1712345678901\"").unwrap();
        assert_eq!(id.as_str(), "1712345678901");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn iso_date_accepts_timestamps() {
        let date = parse_iso_date("2024-05-17T13:45:00.000Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        assert!(parse_iso_date("17/05/2024").is_none());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionKind::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
        assert_eq!(TransactionKind::parse("Ingreso"), Some(TransactionKind::Income));
    }
}
