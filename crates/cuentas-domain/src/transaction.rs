//! Income and expense records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    pub description: String,
    pub amount: f64,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    /// Category name, not an id.
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, alias = "payment_method")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default, alias = "attachment_id")]
    pub receipt_id: Option<EntityId>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        user_id: EntityId,
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        category: impl Into<String>,
        kind: TransactionKind,
    ) -> Self {
        Self {
            id: EntityId::generate(),
            user_id,
            description: description.into(),
            amount,
            date,
            category: category.into(),
            kind,
            payment_method: None,
            person: None,
            receipt_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    /// Amount with sign applied: income positive, expense negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Owned for Transaction {
    fn user_id(&self) -> &EntityId {
        &self.user_id
    }
}
