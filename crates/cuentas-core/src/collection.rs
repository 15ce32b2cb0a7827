//! Typed JSON collections on top of [`KeyValueStore`].

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use cuentas_domain::{
    Attachment, Budget, Category, EntityId, Folder, Identifiable, Owned, PaymentMethod, Person,
    Transaction,
};

use crate::{store::KeyValueStore, CoreError};

/// Storage key names. These are shared with existing data files and must not change.
pub mod keys {
    pub const TRANSACTIONS: &str = "transactions";
    pub const CATEGORIES: &str = "categories";
    /// `PaymentMethod` records.
    pub const PAYMENT_METHODS: &str = "payment_methods";
    /// Plain names offered by the chat assistant. Unrelated to [`PAYMENT_METHODS`].
    pub const QUICK_PAYMENT_METHODS: &str = "paymentMethods";
    pub const BUDGETS: &str = "budgets";
    pub const ATTACHMENTS: &str = "comprobantes";
    pub const FOLDERS: &str = "folders";
    pub const USERS: &str = "users";
    pub const PEOPLE: &str = "people";
    pub const CURRENT_USER: &str = "currentUser";
    pub const SETTINGS_PREFIX: &str = "config_";
    pub const LEARNED_PATTERNS: &str = "learnedPatterns";
    pub const EXPENSE_CATEGORIES: &str = "expenseCategories";
    pub const INCOME_CATEGORIES: &str = "incomeCategories";
}

/// Writes to one collection retry this many times on version conflicts.
pub const MAX_ATTEMPTS: usize = 3;

/// An entity stored in a per-key collection and owned by one profile.
pub trait Record: Serialize + DeserializeOwned + Clone + Identifiable + Owned {
    const KEY: &'static str;
    const ENTITY: &'static str;

    fn set_id(&mut self, id: EntityId);
    fn stamp_created(&mut self, at: DateTime<Utc>);
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}

macro_rules! record {
    ($ty:ty, $key:expr, $entity:literal, |$item:ident, $at:ident| $created:expr) => {
        impl Record for $ty {
            const KEY: &'static str = $key;
            const ENTITY: &'static str = $entity;

            fn set_id(&mut self, id: EntityId) {
                self.id = id;
            }

            fn stamp_created(&mut self, $at: DateTime<Utc>) {
                let $item = self;
                $created;
            }

            fn stamp_updated(&mut self, at: DateTime<Utc>) {
                self.updated_at = Some(at);
            }
        }
    };
}

record!(Transaction, keys::TRANSACTIONS, "Transaction", |item, at| item.created_at = Some(at));
record!(Category, keys::CATEGORIES, "Category", |item, at| item.created_at = Some(at));
record!(PaymentMethod, keys::PAYMENT_METHODS, "Payment method", |item, at| item.created_at = Some(at));
record!(Person, keys::PEOPLE, "Person", |item, at| item.created_at = Some(at));
record!(Budget, keys::BUDGETS, "Budget", |item, at| item.created_at = Some(at));
record!(Attachment, keys::ATTACHMENTS, "Attachment", |item, at| item.created_at = at);
record!(Folder, keys::FOLDERS, "Folder", |item, at| item.created_at = at);

/// A collection as read, with the version it was read at.
///
/// Rows that fail to decode as `T` are kept verbatim in `unreadable` and
/// written back after `items` by [`mutate_collection`].
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub unreadable: Vec<Value>,
    pub version: u64,
}

/// Outcome of a collection mutation closure.
pub enum Mutation<R> {
    /// Persist the modified collection.
    Commit(R),
    /// Leave the stored collection untouched.
    Skip(R),
}

/// Reads the collection under `key`.
///
/// A missing key is an empty collection at version 0. A value that is not a
/// JSON array is logged and read as empty, keeping the stored version so the
/// next write replaces it. Inside an array each row is decoded on its own.
pub fn get_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Snapshot<T>, CoreError> {
    let Some(stored) = store.get(key)? else {
        return Ok(Snapshot {
            items: Vec::new(),
            unreadable: Vec::new(),
            version: 0,
        });
    };
    let rows: Vec<Value> = match serde_json::from_str(&stored.value) {
        Ok(rows) => rows,
        Err(err) => {
            warn!(key, error = %err, "discarding unreadable collection");
            Vec::new()
        }
    };
    let mut items = Vec::with_capacity(rows.len());
    let mut unreadable = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        match T::deserialize(&row) {
            Ok(item) => items.push(item),
            Err(err) => {
                warn!(key, index, error = %err, "skipping unreadable record");
                unreadable.push(row);
            }
        }
    }
    debug!(
        key,
        version = stored.version,
        count = items.len(),
        skipped = unreadable.len(),
        "collection loaded"
    );
    Ok(Snapshot {
        items,
        unreadable,
        version: stored.version,
    })
}

pub fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
    expected_version: Option<u64>,
) -> Result<u64, CoreError> {
    write_rows(store, key, items, &[], expected_version)
}

fn write_rows<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
    unreadable: &[Value],
    expected_version: Option<u64>,
) -> Result<u64, CoreError> {
    let mut rows = Vec::with_capacity(items.len() + unreadable.len());
    for item in items {
        rows.push(serde_json::to_value(item)?);
    }
    rows.extend(unreadable.iter().cloned());
    let json = serde_json::to_string(&rows)?;
    let version = store.put(key, &json, expected_version)?;
    debug!(key, version, count = items.len(), "collection saved");
    Ok(version)
}

/// Read-modify-write with compare-and-swap, re-applying `apply` on conflicts.
///
/// Unreadable rows are not shown to `apply` and survive the write.
pub fn mutate_collection<T, R, F>(
    store: &dyn KeyValueStore,
    key: &str,
    mut apply: F,
) -> Result<R, CoreError>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(&mut Vec<T>) -> Result<Mutation<R>, CoreError>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let Snapshot {
            mut items,
            unreadable,
            version,
        } = get_collection::<T>(store, key)?;
        let result = match apply(&mut items)? {
            Mutation::Skip(result) => return Ok(result),
            Mutation::Commit(result) => result,
        };
        match write_rows(store, key, &items, &unreadable, Some(version)) {
            Ok(_) => return Ok(result),
            Err(CoreError::Conflict { .. }) => {
                debug!(key, attempt, "version conflict, retrying");
            }
            Err(err) => return Err(err),
        }
    }
    warn!(key, "giving up after repeated version conflicts");
    Err(CoreError::Conflict {
        key: key.to_string(),
    })
}

/// Reads a single JSON value. Unparsable values read as absent.
pub fn get_value<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, CoreError> {
    let Some(stored) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&stored.value) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable value");
            Ok(None)
        }
    }
}

pub fn set_value<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), CoreError> {
    let json = serde_json::to_string(value)?;
    store.put(key, &json, None)?;
    Ok(())
}
