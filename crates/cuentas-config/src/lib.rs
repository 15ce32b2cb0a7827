//! cuentas-config
//!
//! Application configuration: where data lives, the store quota, display
//! preferences, and the log filter. Owns the Config model plus disk
//! persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{base_dir, ConfigManager, HOME_ENV};
pub use model::Config;
