//! Generic CRUD over one record collection.
//!
//! Every operation reads the whole collection and, when it changes
//! something, writes the whole collection back under compare-and-swap.

use std::marker::PhantomData;

use cuentas_domain::{EntityId, Identifiable, Owned};

use crate::{
    collection::{get_collection, mutate_collection, Mutation, Record},
    database::Database,
    CoreError,
};

pub struct Repository<'a, T: Record> {
    db: &'a Database,
    _record: PhantomData<T>,
}

impl<'a, T: Record> Repository<'a, T> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    /// Every record in the collection, regardless of owner.
    pub fn all(&self) -> Result<Vec<T>, CoreError> {
        Ok(get_collection(self.db.store(), T::KEY)?.items)
    }

    pub fn list(&self, user_id: &EntityId) -> Result<Vec<T>, CoreError> {
        self.list_where(user_id, |_| true)
    }

    pub fn list_where<P>(&self, user_id: &EntityId, predicate: P) -> Result<Vec<T>, CoreError>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .all()?
            .into_iter()
            .filter(|item| item.user_id() == user_id && predicate(item))
            .collect())
    }

    pub fn get(&self, user_id: &EntityId, id: &EntityId) -> Result<Option<T>, CoreError> {
        Ok(self
            .all()?
            .into_iter()
            .find(|item| item.id() == id && item.user_id() == user_id))
    }

    /// Appends `record` under a fresh id and creation stamp.
    pub fn add(&self, mut record: T) -> Result<T, CoreError> {
        record.set_id(EntityId::generate());
        record.stamp_created(self.db.now());
        mutate_collection(self.db.store(), T::KEY, |items: &mut Vec<T>| {
            items.push(record.clone());
            Ok(Mutation::Commit(()))
        })?;
        tracing::debug!(entity = T::ENTITY, id = %record.id(), "record added");
        Ok(record)
    }

    /// Applies `patch` to the record with `id`. Returns `None`, without
    /// writing, when no such record exists.
    pub fn update<F>(&self, id: &EntityId, mut patch: F) -> Result<Option<T>, CoreError>
    where
        F: FnMut(&mut T),
    {
        let now = self.db.now();
        mutate_collection(self.db.store(), T::KEY, |items: &mut Vec<T>| {
            let Some(item) = items.iter_mut().find(|item| item.id() == id) else {
                return Ok(Mutation::Skip(None));
            };
            patch(item);
            item.stamp_updated(now);
            Ok(Mutation::Commit(Some(item.clone())))
        })
    }

    /// Applies `patch` to every record matching `predicate` in a single write.
    /// Returns how many records changed.
    pub fn update_where<P, F>(&self, predicate: P, mut patch: F) -> Result<usize, CoreError>
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let now = self.db.now();
        mutate_collection(self.db.store(), T::KEY, |items: &mut Vec<T>| {
            let mut changed = 0;
            for item in items.iter_mut().filter(|item| predicate(item)) {
                patch(item);
                item.stamp_updated(now);
                changed += 1;
            }
            Ok(if changed == 0 {
                Mutation::Skip(0)
            } else {
                Mutation::Commit(changed)
            })
        })
    }

    /// Removes the record with `id`. Unknown ids are a no-op returning `false`.
    pub fn remove(&self, id: &EntityId) -> Result<bool, CoreError> {
        let removed = self.remove_where(|item| item.id() == id)?;
        Ok(!removed.is_empty())
    }

    /// Removes every record matching `predicate`, returning them.
    pub fn remove_where<P>(&self, predicate: P) -> Result<Vec<T>, CoreError>
    where
        P: Fn(&T) -> bool,
    {
        mutate_collection(self.db.store(), T::KEY, |items: &mut Vec<T>| {
            let (removed, kept): (Vec<T>, Vec<T>) =
                std::mem::take(items).into_iter().partition(|item| predicate(item));
            *items = kept;
            Ok(if removed.is_empty() {
                Mutation::Skip(removed)
            } else {
                Mutation::Commit(removed)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use cuentas_domain::{Category, Transaction, TransactionKind};

    use super::*;

    fn txn(user: &str, description: &str) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Transaction::new(user.into(), description, 100.0, date, "Comida", TransactionKind::Expense)
    }

    #[test]
    fn list_is_owner_filtered() {
        let db = Database::in_memory();
        let repo = db.repository::<Transaction>();
        repo.add(txn("ana", "Super")).unwrap();
        repo.add(txn("beto", "Taxi")).unwrap();

        let ana = repo.list(&"ana".into()).unwrap();
        assert_eq!(ana.len(), 1);
        assert_eq!(ana[0].description, "Super");
        assert!(repo.list(&"carla".into()).unwrap().is_empty());
    }

    #[test]
    fn add_assigns_id_and_created_stamp() {
        let db = Database::in_memory();
        let repo = db.repository::<Category>();
        let draft = Category::new("ana".into(), "Comida", TransactionKind::Expense);
        let draft_id = draft.id.clone();
        let added = repo.add(draft).unwrap();
        assert_ne!(added.id, draft_id);
        assert!(added.created_at.is_some());

        let listed = repo.list(&"ana".into()).unwrap();
        assert_eq!(listed.iter().filter(|c| c.id == added.id).count(), 1);
    }

    #[test]
    fn get_hides_records_of_other_users() {
        let db = Database::in_memory();
        let repo = db.repository::<Transaction>();
        let added = repo.add(txn("ana", "Super")).unwrap();
        assert!(repo.get(&"ana".into(), &added.id).unwrap().is_some());
        assert!(repo.get(&"beto".into(), &added.id).unwrap().is_none());
    }

    #[test]
    fn update_of_unknown_id_does_not_write() {
        let db = Database::in_memory();
        let repo = db.repository::<Transaction>();
        let result = repo.update(&"missing".into(), |t| t.amount = 1.0).unwrap();
        assert!(result.is_none());
        assert!(db.store().get(Transaction::KEY).unwrap().is_none());
    }

    #[test]
    fn update_is_idempotent_apart_from_stamp() {
        let db = Database::in_memory();
        let repo = db.repository::<Transaction>();
        let added = repo.add(txn("ana", "Super")).unwrap();
        let mut first = repo.update(&added.id, |t| t.amount = 750.0).unwrap().unwrap();
        let mut second = repo.update(&added.id, |t| t.amount = 750.0).unwrap().unwrap();
        first.updated_at = None;
        second.updated_at = None;
        assert_eq!(first, second);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let db = Database::in_memory();
        let repo = db.repository::<Transaction>();
        let added = repo.add(txn("ana", "Super")).unwrap();
        assert!(!repo.remove(&"nope".into()).unwrap());
        assert!(repo.remove(&added.id).unwrap());
        assert!(repo.list(&"ana".into()).unwrap().is_empty());
        assert!(!repo.remove(&added.id).unwrap());
    }
}
