pub mod build_info;
pub mod paths;

/// Installs the global fmt subscriber, writing to stderr so command output
/// stays clean. `RUST_LOG` overrides `filter`.
pub fn init_tracing(filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(cuentas_config::model::DEFAULT_LOG_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
