use chrono::{Datelike, Duration, NaiveDate};
use tracing::info;

use cuentas_domain::{Attachment, EntityId, Transaction, TransactionKind};

use crate::{
    collection::{mutate_collection, Mutation, Record},
    database::Database,
    CoreError,
};

/// Fields a caller supplies when recording a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub category: String,
    pub kind: TransactionKind,
    pub payment_method: Option<String>,
    pub person: Option<String>,
    pub receipt_id: Option<EntityId>,
}

impl NewTransaction {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        category: impl Into<String>,
        kind: TransactionKind,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category: category.into(),
            kind,
            payment_method: None,
            person: None,
            receipt_id: None,
        }
    }

    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }
}

/// Date windows offered by the transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Today,
    /// From the most recent Sunday.
    ThisWeek,
    ThisMonth,
    /// Inclusive bounds; a missing end means "up to today".
    Custom {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match *self {
            DateRange::Today => date >= today,
            DateRange::ThisWeek => {
                let offset = today.weekday().num_days_from_sunday() as i64;
                date >= today - Duration::days(offset)
            }
            DateRange::ThisMonth => date >= today.with_day(1).unwrap_or(today),
            DateRange::Custom { start, end } => date >= start && date <= end.unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    /// Case-insensitive match against description or category.
    pub search: Option<String>,
    pub range: Option<DateRange>,
}

impl TransactionFilter {
    pub fn matches(&self, txn: &Transaction, today: NaiveDate) -> bool {
        if self.kind.is_some_and(|kind| kind != txn.kind) {
            return false;
        }
        if let Some(category) = &self.category {
            if &txn.category != category {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref().filter(|term| !term.is_empty()) {
            let term = term.to_lowercase();
            if !txn.description.to_lowercase().contains(&term)
                && !txn.category.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        self.range
            .map_or(true, |range| range.contains(txn.date, today))
    }
}

pub struct TransactionService;

impl TransactionService {
    pub fn create(
        db: &Database,
        user_id: &EntityId,
        draft: NewTransaction,
    ) -> Result<Transaction, CoreError> {
        let mut txn = Transaction::new(
            user_id.clone(),
            draft.description.trim(),
            draft.amount,
            draft.date,
            draft.category.trim(),
            draft.kind,
        );
        txn.payment_method = clean(draft.payment_method);
        txn.person = clean(draft.person);
        txn.receipt_id = draft.receipt_id;
        Self::validate(&txn)?;
        let txn = db.repository::<Transaction>().add(txn)?;
        info!(id = %txn.id, kind = txn.kind.as_str(), amount = txn.amount, "transaction recorded");
        Ok(txn)
    }

    /// The user's transactions, newest first.
    pub fn list(db: &Database, user_id: &EntityId) -> Result<Vec<Transaction>, CoreError> {
        let mut items = db.repository::<Transaction>().list(user_id)?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    pub fn filter(
        db: &Database,
        user_id: &EntityId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CoreError> {
        let today = db.today();
        let mut items = db
            .repository::<Transaction>()
            .list_where(user_id, |txn| filter.matches(txn, today))?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    pub fn get(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<Transaction, CoreError> {
        db.repository::<Transaction>()
            .get(user_id, id)?
            .ok_or_else(|| CoreError::not_found("Transaction", id))
    }

    /// Applies `mutator` to the freshest stored copy and revalidates before
    /// persisting. On a version conflict `mutator` runs again on the reread
    /// record, so edits made meanwhile to other fields are kept.
    pub fn update<F>(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        mut mutator: F,
    ) -> Result<Transaction, CoreError>
    where
        F: FnMut(&mut Transaction),
    {
        let now = db.now();
        let updated = mutate_collection(db.store(), Transaction::KEY, |items: &mut Vec<Transaction>| {
            let Some(stored) = items
                .iter_mut()
                .find(|txn| &txn.id == id && &txn.user_id == user_id)
            else {
                return Ok(Mutation::Skip(None));
            };
            let mut candidate = stored.clone();
            mutator(&mut candidate);
            candidate.id = stored.id.clone();
            candidate.user_id = stored.user_id.clone();
            candidate.created_at = stored.created_at;
            candidate.stamp_updated(now);
            Self::validate(&candidate)?;
            *stored = candidate.clone();
            Ok(Mutation::Commit(Some(candidate)))
        })?;
        let updated = updated.ok_or_else(|| CoreError::not_found("Transaction", id))?;
        info!(id = %updated.id, "transaction updated");
        Ok(updated)
    }

    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        if Self::get(db, user_id, id).is_err() {
            return Ok(false);
        }
        db.repository::<Transaction>().remove(id)
    }

    /// Links (or, with `None`, unlinks) a receipt.
    pub fn attach_receipt(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        attachment_id: Option<&EntityId>,
    ) -> Result<Transaction, CoreError> {
        if let Some(attachment_id) = attachment_id {
            db.repository::<Attachment>()
                .get(user_id, attachment_id)?
                .ok_or_else(|| CoreError::not_found("Attachment", attachment_id))?;
        }
        let receipt = attachment_id.cloned();
        Self::update(db, user_id, id, |txn| txn.receipt_id = receipt.clone())
    }

    /// Clears `receiptId` on every transaction pointing at one of `attachment_ids`.
    pub fn clear_receipts(db: &Database, attachment_ids: &[EntityId]) -> Result<usize, CoreError> {
        if attachment_ids.is_empty() {
            return Ok(0);
        }
        db.repository::<Transaction>().update_where(
            |txn| {
                txn.receipt_id
                    .as_ref()
                    .is_some_and(|receipt| attachment_ids.contains(receipt))
            },
            |txn| txn.receipt_id = None,
        )
    }

    fn validate(txn: &Transaction) -> Result<(), CoreError> {
        if txn.description.trim().is_empty() {
            return Err(CoreError::Validation("description must not be empty".into()));
        }
        if !txn.amount.is_finite() || txn.amount <= 0.0 {
            return Err(CoreError::Validation("amount must be greater than zero".into()));
        }
        if txn.category.trim().is_empty() {
            return Err(CoreError::Validation("category must not be empty".into()));
        }
        Ok(())
    }
}

pub(crate) fn sort_newest_first(items: &mut [Transaction]) {
    items.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::store::{KeyValueStore, MemoryStore, StoreUsage, StoredValue};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-05-15 is a Wednesday.
        let today = day(2024, 5, 15);
        assert!(DateRange::ThisWeek.contains(day(2024, 5, 12), today));
        assert!(!DateRange::ThisWeek.contains(day(2024, 5, 11), today));
    }

    #[test]
    fn custom_range_defaults_end_to_today() {
        let today = day(2024, 5, 15);
        let range = DateRange::Custom {
            start: day(2024, 5, 1),
            end: None,
        };
        assert!(range.contains(day(2024, 5, 15), today));
        assert!(!range.contains(day(2024, 5, 16), today));
        assert!(!range.contains(day(2024, 4, 30), today));
    }

    #[test]
    fn create_rejects_invalid_drafts() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let date = day(2024, 1, 1);
        let cases = [
            NewTransaction::new("  ", 10.0, date, "Comida", TransactionKind::Expense),
            NewTransaction::new("Super", 0.0, date, "Comida", TransactionKind::Expense),
            NewTransaction::new("Super", -5.0, date, "Comida", TransactionKind::Expense),
            NewTransaction::new("Super", 10.0, date, "", TransactionKind::Expense),
        ];
        for draft in cases {
            let err = TransactionService::create(&db, &user, draft).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
        assert!(TransactionService::list(&db, &user).unwrap().is_empty());
    }

    #[test]
    fn filter_combines_search_and_kind() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let date = db.today();
        for (description, category, kind) in [
            ("Super Coto", "Comida", TransactionKind::Expense),
            ("Uber", "Transporte", TransactionKind::Expense),
            ("Sueldo", "Salario", TransactionKind::Income),
        ] {
            TransactionService::create(
                &db,
                &user,
                NewTransaction::new(description, 100.0, date, category, kind),
            )
            .unwrap();
        }

        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            search: Some("COMI".into()),
            ..TransactionFilter::default()
        };
        let found = TransactionService::filter(&db, &user, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "Super Coto");
    }

    #[test]
    fn update_keeps_identity_and_validates() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let txn = TransactionService::create(
            &db,
            &user,
            NewTransaction::new("Super", 500.0, day(2024, 1, 1), "Comida", TransactionKind::Expense),
        )
        .unwrap();

        let updated = TransactionService::update(&db, &user, &txn.id, |t| t.amount = 650.0).unwrap();
        assert_eq!(updated.amount, 650.0);
        assert_eq!(updated.created_at, txn.created_at);
        assert!(updated.updated_at.is_some());

        let err = TransactionService::update(&db, &user, &txn.id, |t| t.amount = 0.0).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let other = EntityId::from("beto");
        let err = TransactionService::update(&db, &other, &txn.id, |t| t.amount = 1.0).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    /// Renames the first stored transaction right before the next write lands.
    struct RenamingStore {
        inner: MemoryStore,
        pending: AtomicBool,
    }

    impl KeyValueStore for RenamingStore {
        fn get(&self, key: &str) -> Result<Option<StoredValue>, CoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str, expected: Option<u64>) -> Result<u64, CoreError> {
            if self.pending.swap(false, Ordering::SeqCst) {
                let current = self.inner.get(key)?.unwrap();
                let mut rows: Vec<serde_json::Value> = serde_json::from_str(&current.value)?;
                rows[0]["description"] = "Super Coto".into();
                self.inner.put(key, &serde_json::to_string(&rows)?, None)?;
            }
            self.inner.put(key, value, expected)
        }

        fn delete(&self, key: &str) -> Result<bool, CoreError> {
            self.inner.delete(key)
        }

        fn scan(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
            self.inner.scan(prefix)
        }

        fn usage(&self) -> Result<StoreUsage, CoreError> {
            self.inner.usage()
        }
    }

    #[test]
    fn concurrent_edits_to_other_fields_are_kept() {
        let store = Arc::new(RenamingStore {
            inner: MemoryStore::new(),
            pending: AtomicBool::new(false),
        });
        let shared: Arc<dyn KeyValueStore> = store.clone();
        let db = Database::new(shared);
        let user = EntityId::from("ana");
        let txn = TransactionService::create(
            &db,
            &user,
            NewTransaction::new("Super", 500.0, day(2024, 1, 1), "Comida", TransactionKind::Expense),
        )
        .unwrap();

        store.pending.store(true, Ordering::SeqCst);
        let mut runs = 0;
        let updated = TransactionService::update(&db, &user, &txn.id, |t| {
            runs += 1;
            t.amount = 650.0;
        })
        .unwrap();

        assert_eq!(runs, 2);
        assert_eq!(updated.description, "Super Coto");
        assert_eq!(updated.amount, 650.0);
        let stored = TransactionService::get(&db, &user, &txn.id).unwrap();
        assert_eq!(stored.description, "Super Coto");
        assert_eq!(stored.amount, 650.0);
    }
}
