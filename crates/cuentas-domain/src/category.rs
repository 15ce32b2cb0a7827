//! Domain types representing transaction categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

/// Categorises transactions. Transactions reference categories by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(user_id: EntityId, name: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            id: EntityId::generate(),
            user_id,
            name: name.into(),
            kind,
            created_at: None,
            updated_at: None,
        }
    }

    /// Same name (ignoring case and surrounding whitespace) and same kind.
    pub fn same_slot(&self, name: &str, kind: TransactionKind) -> bool {
        self.kind == kind && self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

impl Identifiable for Category {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Owned for Category {
    fn user_id(&self) -> &EntityId {
        &self.user_id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

