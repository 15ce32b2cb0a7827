#![doc(test(attr(deny(warnings))))]

//! Cuentas: a personal finance tracker for profiles sharing one local store.
//! This crate glues the workspace crates together and hosts the
//! `cuentas_cli` shell.

pub mod cli;
pub mod errors;
pub mod utils;

pub use errors::{AppError, CliError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_filter(cuentas_config::model::DEFAULT_LOG_FILTER);
}

/// Initializes global tracing once; `RUST_LOG` wins over `filter`.
pub fn init_with_filter(filter: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::debug!("tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init_with_filter("cuentas=trace");
    }
}
