//! cuentas-core
//!
//! Business logic for Cuentas: the key-value store contract, typed
//! collections, entity services, profile sessions, the chat parser, and
//! dashboard figures. Depends on cuentas-domain. No CLI, no terminal I/O,
//! no filesystem access.

pub mod attachment_service;
pub mod budget_service;
pub mod category_service;
pub mod collection;
pub mod database;
pub mod error;
pub mod folder_service;
pub mod format;
pub mod lookup_service;
pub mod parser;
pub mod repository;
pub mod session;
pub mod settings_service;
pub mod store;
pub mod summary_service;
pub mod time;
pub mod transaction_service;

pub use attachment_service::*;
pub use budget_service::*;
pub use category_service::*;
pub use collection::{keys, Record};
pub use database::Database;
pub use error::CoreError;
pub use folder_service::*;
pub use lookup_service::*;
pub use repository::Repository;
pub use session::Session;
pub use settings_service::*;
pub use store::{KeyValueStore, MemoryStore, StoreUsage, StoredValue};
pub use summary_service::*;
pub use transaction_service::*;
