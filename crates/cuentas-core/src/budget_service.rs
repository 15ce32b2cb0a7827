use cuentas_domain::{Budget, BudgetPeriod, EntityId, Transaction};

use crate::{database::Database, CoreError};

/// Usage above this share of the limit is a warning.
pub const WARNING_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > 100.0 {
            BudgetStatus::Exceeded
        } else if percentage >= WARNING_THRESHOLD {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

pub struct BudgetService;

impl BudgetService {
    /// Creates a budget. A user holds at most one budget per category.
    pub fn create(
        db: &Database,
        user_id: &EntityId,
        category: &str,
        amount: f64,
        period: BudgetPeriod,
    ) -> Result<Budget, CoreError> {
        let category = category.trim();
        Self::validate(category, amount)?;
        let repo = db.repository::<Budget>();
        let wanted = category.to_lowercase();
        if repo
            .list(user_id)?
            .iter()
            .any(|budget| budget.category.trim().to_lowercase() == wanted)
        {
            return Err(CoreError::Validation(format!(
                "a budget for `{category}` already exists"
            )));
        }
        let mut budget = Budget::new(user_id.clone(), category, amount);
        budget.period = period;
        repo.add(budget)
    }

    pub fn list(db: &Database, user_id: &EntityId) -> Result<Vec<Budget>, CoreError> {
        let mut budgets = db.repository::<Budget>().list(user_id)?;
        budgets.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(budgets)
    }

    pub fn update(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        amount: f64,
        period: BudgetPeriod,
    ) -> Result<Budget, CoreError> {
        let repo = db.repository::<Budget>();
        let current = repo
            .get(user_id, id)?
            .ok_or_else(|| CoreError::not_found("Budget", id))?;
        Self::validate(&current.category, amount)?;
        repo.update(id, |budget| {
            budget.amount = amount;
            budget.period = period;
        })?
        .ok_or_else(|| CoreError::not_found("Budget", id))
    }

    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        let repo = db.repository::<Budget>();
        if repo.get(user_id, id)?.is_none() {
            return Ok(false);
        }
        repo.remove(id)
    }

    /// Spending against each budget, counting every expense in its category.
    pub fn progress(db: &Database, user_id: &EntityId) -> Result<Vec<BudgetProgress>, CoreError> {
        let expenses = db
            .repository::<Transaction>()
            .list_where(user_id, Transaction::is_expense)?;
        Ok(Self::list(db, user_id)?
            .into_iter()
            .map(|budget| Self::measure(budget, &expenses))
            .collect())
    }

    pub fn measure(budget: Budget, expenses: &[Transaction]) -> BudgetProgress {
        let spent: f64 = expenses
            .iter()
            .filter(|txn| txn.is_expense() && txn.category == budget.category)
            .map(|txn| txn.amount)
            .sum();
        let percentage = if budget.amount > 0.0 {
            spent / budget.amount * 100.0
        } else {
            0.0
        };
        BudgetProgress {
            remaining: budget.amount - spent,
            status: BudgetStatus::from_percentage(percentage),
            budget,
            spent,
            percentage,
        }
    }

    fn validate(category: &str, amount: f64) -> Result<(), CoreError> {
        if category.is_empty() {
            return Err(CoreError::Validation("budget category must not be empty".into()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::Validation("budget amount must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use cuentas_domain::TransactionKind;

    use super::*;

    fn expense(category: &str, amount: f64) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        Transaction::new("ana".into(), "x", amount, date, category, TransactionKind::Expense)
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(BudgetStatus::from_percentage(79.9), BudgetStatus::OnTrack);
        assert_eq!(BudgetStatus::from_percentage(80.0), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_percentage(100.0), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_percentage(100.1), BudgetStatus::Exceeded);
    }

    #[test]
    fn measure_counts_only_matching_expenses() {
        let budget = Budget::new("ana".into(), "Comida", 1000.0);
        let mut income = expense("Comida", 999.0);
        income.kind = TransactionKind::Income;
        let txns = vec![expense("Comida", 300.0), expense("Comida", 550.0), expense("Salud", 400.0), income];
        let progress = BudgetService::measure(budget, &txns);
        assert_eq!(progress.spent, 850.0);
        assert_eq!(progress.remaining, 150.0);
        assert_eq!(progress.status, BudgetStatus::Warning);
    }

    #[test]
    fn create_rejects_second_budget_for_category() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        BudgetService::create(&db, &user, "Comida", 1000.0, BudgetPeriod::Monthly).unwrap();
        let err = BudgetService::create(&db, &user, "Comida", 500.0, BudgetPeriod::Yearly)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_category_check_ignores_case() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        BudgetService::create(&db, &user, "Alimentación", 50_000.0, BudgetPeriod::Monthly).unwrap();

        for category in ["alimentación", "ALIMENTACIÓN", " Alimentación "] {
            let err = BudgetService::create(&db, &user, category, 1_000.0, BudgetPeriod::Monthly)
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{category}");
        }
        assert_eq!(BudgetService::list(&db, &user).unwrap().len(), 1);

        BudgetService::create(&db, &EntityId::from("beto"), "alimentación", 1_000.0, BudgetPeriod::Monthly)
            .unwrap();
    }
}
