use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

/// A spending limit for one expense category, referenced by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Budget {
    pub fn new(user_id: EntityId, category: impl Into<String>, amount: f64) -> Self {
        Self {
            id: EntityId::generate(),
            user_id,
            category: category.into(),
            amount,
            period: BudgetPeriod::default(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for Budget {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Owned for Budget {
    fn user_id(&self) -> &EntityId {
        &self.user_id
    }
}

/// Enumeration of budgeting periods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        };
        f.write_str(label)
    }
}
