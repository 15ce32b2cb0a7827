//! cuentas-domain
//!
//! Pure domain models (Profile, Transaction, Category, Budget, Attachment, etc.).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod attachment;
pub mod budget;
pub mod category;
pub mod common;
pub mod pattern;
pub mod payment_method;
pub mod profile;
pub mod settings;
pub mod transaction;

pub use attachment::*;
pub use budget::*;
pub use category::*;
pub use common::*;
pub use pattern::*;
pub use payment_method::*;
pub use profile::*;
pub use settings::*;
pub use transaction::*;
