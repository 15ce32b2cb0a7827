use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    collection::Record,
    repository::Repository,
    store::{KeyValueStore, MemoryStore},
    time::{Clock, SystemClock},
};

/// Handle passed to every service: the backing store plus a clock.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl Database {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn repository<T: Record>(&self) -> Repository<'_, T> {
        Repository::new(self)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
