use serde::{Deserialize, Serialize};

use crate::common::TransactionKind;

/// A phrase the chat assistant associates with a transaction shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearnedPattern {
    pub phrase: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub count: u32,
}

impl LearnedPattern {
    pub fn new(phrase: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            phrase: phrase.into(),
            kind,
            category: None,
            payment_method: None,
            multiplier: None,
            context: None,
            count: 1,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn same_phrase(&self, phrase: &str) -> bool {
        self.phrase.to_lowercase() == phrase.to_lowercase()
    }
}
