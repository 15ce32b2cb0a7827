//! Named lookups owned by a profile: payment methods and people.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    pub name: String,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PaymentMethod {
    pub fn new(user_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            user_id,
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Someone expenses can be split with. Stored in the `people` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    pub name: String,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Person {
    pub fn new(user_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            user_id,
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

macro_rules! named_record {
    ($ty:ty) => {
        impl Identifiable for $ty {
            fn id(&self) -> &EntityId {
                &self.id
            }
        }

        impl Owned for $ty {
            fn user_id(&self) -> &EntityId {
                &self.user_id
            }
        }

        impl NamedEntity for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

named_record!(PaymentMethod);
named_record!(Person);
