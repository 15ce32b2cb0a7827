//! Lists and learned phrases the chat assistant works with. They are global
//! to the store rather than per profile.

use tracing::debug;

use cuentas_domain::{LearnedPattern, TransactionKind};

use crate::{
    collection::{get_value, keys, mutate_collection, set_value, Mutation},
    database::Database,
    CoreError,
};

use super::rules::{SALARY, TRANSFER};

pub const DEFAULT_EXPENSE_VOCABULARY: &[&str] = &[
    "Comida",
    "Transporte",
    "Servicios",
    "Entretenimiento",
    "Salud",
    "Otros",
];
pub const DEFAULT_INCOME_VOCABULARY: &[&str] =
    &["Salario", "Freelance", "Regalo", "Inversión", "Otros"];
pub const DEFAULT_QUICK_METHODS: &[&str] =
    &["Efectivo", "mercado pago", "debito", "Transferencia", "Otros"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub expense_categories: Vec<String>,
    pub income_categories: Vec<String>,
    pub payment_methods: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            expense_categories: owned(DEFAULT_EXPENSE_VOCABULARY),
            income_categories: owned(DEFAULT_INCOME_VOCABULARY),
            payment_methods: owned(DEFAULT_QUICK_METHODS),
        }
    }
}

impl Vocabulary {
    /// Reads the three lists, writing back defaults for any that are missing.
    pub fn load(db: &Database) -> Result<Self, CoreError> {
        Ok(Self {
            expense_categories: load_list(db, keys::EXPENSE_CATEGORIES, DEFAULT_EXPENSE_VOCABULARY)?,
            income_categories: load_list(db, keys::INCOME_CATEGORIES, DEFAULT_INCOME_VOCABULARY)?,
            payment_methods: load_list(db, keys::QUICK_PAYMENT_METHODS, DEFAULT_QUICK_METHODS)?,
        })
    }

    pub fn save(&self, db: &Database) -> Result<(), CoreError> {
        set_value(db.store(), keys::EXPENSE_CATEGORIES, &self.expense_categories)?;
        set_value(db.store(), keys::INCOME_CATEGORIES, &self.income_categories)?;
        set_value(db.store(), keys::QUICK_PAYMENT_METHODS, &self.payment_methods)
    }

    /// The method assumed for income that arrives without one.
    pub fn default_payment_method(&self) -> String {
        self.payment_methods
            .first()
            .cloned()
            .unwrap_or_else(|| "Efectivo".into())
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn load_list(db: &Database, key: &str, defaults: &[&str]) -> Result<Vec<String>, CoreError> {
    if let Some(list) = get_value::<Vec<String>>(db.store(), key)? {
        return Ok(list);
    }
    debug!(key, "writing default vocabulary");
    let list = owned(defaults);
    set_value(db.store(), key, &list)?;
    Ok(list)
}

/// Phrases the assistant has learned, stored under `learnedPatterns`.
pub struct PatternBook;

impl PatternBook {
    pub fn defaults() -> Vec<LearnedPattern> {
        use TransactionKind::{Expense, Income};

        let mut patterns = Vec::new();
        for (phrase, multiplier) in [
            ("palo", 1_000_000.0),
            ("palos", 1_000_000.0),
            ("lucas", 1_000.0),
            ("luca", 1_000.0),
        ] {
            patterns.push(LearnedPattern::new(phrase, Income).with_multiplier(multiplier));
        }
        for (phrase, kind) in [
            ("me mandó", Income),
            ("le mande", Expense),
            ("le mandé", Expense),
            ("me mandaron", Income),
            ("me transfirió", Income),
            ("me transfirieron", Income),
        ] {
            patterns.push(
                LearnedPattern::new(phrase, kind)
                    .with_category(TRANSFER)
                    .with_payment_method(TRANSFER),
            );
        }
        for phrase in ["sueldo", "salario"] {
            patterns.push(
                LearnedPattern::new(phrase, Income)
                    .with_category(SALARY)
                    .with_payment_method(TRANSFER)
                    .with_context("salario"),
            );
        }
        for phrase in ["me pagaron", "cobré"] {
            patterns.push(
                LearnedPattern::new(phrase, Income)
                    .with_category(SALARY)
                    .with_context("salario"),
            );
        }
        patterns.push(
            LearnedPattern::new("gaste", Expense)
                .with_category("transferencia")
                .with_payment_method("mercado pago"),
        );
        patterns.into_iter().map(|p| p.with_count(5)).collect()
    }

    /// Stored patterns, or the defaults (persisted) when none are stored.
    pub fn load(db: &Database) -> Result<Vec<LearnedPattern>, CoreError> {
        if let Some(patterns) = get_value(db.store(), keys::LEARNED_PATTERNS)? {
            return Ok(patterns);
        }
        let patterns = Self::defaults();
        set_value(db.store(), keys::LEARNED_PATTERNS, &patterns)?;
        Ok(patterns)
    }

    /// Adds `pattern`, or merges it into the stored pattern with the same
    /// phrase (ignoring case) and bumps that pattern's count.
    pub fn learn(db: &Database, pattern: LearnedPattern) -> Result<LearnedPattern, CoreError> {
        if pattern.phrase.trim().is_empty() {
            return Err(CoreError::Validation("a phrase is required".into()));
        }
        Self::load(db)?;
        mutate_collection(db.store(), keys::LEARNED_PATTERNS, |patterns: &mut Vec<LearnedPattern>| {
            let learned = match patterns.iter_mut().find(|p| p.same_phrase(&pattern.phrase)) {
                Some(existing) => {
                    existing.kind = pattern.kind;
                    if pattern.category.is_some() {
                        existing.category.clone_from(&pattern.category);
                    }
                    if pattern.payment_method.is_some() {
                        existing.payment_method.clone_from(&pattern.payment_method);
                    }
                    if pattern.multiplier.is_some() {
                        existing.multiplier = pattern.multiplier;
                    }
                    if pattern.context.is_some() {
                        existing.context.clone_from(&pattern.context);
                    }
                    existing.count += 1;
                    existing.clone()
                }
                None => {
                    let fresh = pattern.clone().with_count(1);
                    patterns.push(fresh.clone());
                    fresh
                }
            };
            Ok(Mutation::Commit(learned))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_are_written_back() {
        let db = Database::in_memory();
        let vocabulary = Vocabulary::load(&db).unwrap();
        assert_eq!(vocabulary, Vocabulary::default());
        assert!(db.store().get("paymentMethods").unwrap().is_some());
        assert!(db.store().get("expenseCategories").unwrap().is_some());
    }

    #[test]
    fn stored_lists_win_over_defaults() {
        let db = Database::in_memory();
        db.store().put("incomeCategories", r#"["Alquileres"]"#, None).unwrap();
        let vocabulary = Vocabulary::load(&db).unwrap();
        assert_eq!(vocabulary.income_categories, vec!["Alquileres"]);
    }

    #[test]
    fn learning_merges_by_phrase() {
        let db = Database::in_memory();
        let before = PatternBook::load(&db).unwrap().len();
        let updated = PatternBook::learn(
            &db,
            LearnedPattern::new("LUCAS", TransactionKind::Expense).with_context("jerga"),
        )
        .unwrap();
        assert_eq!(updated.count, 6);
        assert_eq!(updated.multiplier, Some(1_000.0));
        assert_eq!(updated.context.as_deref(), Some("jerga"));

        let fresh = PatternBook::learn(
            &db,
            LearnedPattern::new("gambas", TransactionKind::Expense).with_multiplier(100.0),
        )
        .unwrap();
        assert_eq!(fresh.count, 1);
        assert_eq!(PatternBook::load(&db).unwrap().len(), before + 1);
    }
}
