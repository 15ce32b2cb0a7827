use std::path::{Path, PathBuf};

use cuentas_config::Config;

/// Directories the shell works in, all under one base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub base: PathBuf,
    pub data: PathBuf,
    pub history: PathBuf,
}

impl AppPaths {
    pub fn resolve(base: &Path, config: &Config) -> Self {
        Self {
            base: base.to_path_buf(),
            data: config.resolve_data_dir(base),
            history: base.join("history.txt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_follows_config() {
        let base = Path::new("/tmp/cuentas-home");
        let mut config = Config::default();
        assert_eq!(AppPaths::resolve(base, &config).data, base.join("data"));

        config.data_dir = Some(PathBuf::from("/srv/cuentas"));
        let paths = AppPaths::resolve(base, &config);
        assert_eq!(paths.data, PathBuf::from("/srv/cuentas"));
        assert_eq!(paths.history, base.join("history.txt"));
    }
}
