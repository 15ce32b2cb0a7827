use cuentas_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn defaults_target_argentina() {
    let cfg = Config::default();

    assert_eq!(cfg.currency, "ARS");
    assert_eq!(cfg.locale, "es-AR");
    assert_eq!(cfg.quota_bytes, Some(5 * 1024 * 1024));
    assert_eq!(cfg.backup_retention, 5);
    assert_eq!(cfg.log_filter, "cuentas=info");
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path()).expect("manager");
    assert_eq!(manager.load().expect("defaults"), Config::default());

    let mut cfg = Config::default();
    cfg.set("currency", "usd").expect("currency");
    cfg.set("quota_bytes", "none").expect("quota");
    cfg.last_user = Some("ana".into());

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded.currency, "USD");
    assert_eq!(loaded.quota_bytes, None);
    assert_eq!(loaded.last_user.as_deref(), Some("ana"));
    assert!(manager.config_path().ends_with("config/config.json"));
}

#[test]
fn older_files_fill_missing_fields() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path()).expect("manager");
    std::fs::write(
        manager.config_path(),
        r#"{ "locale": "es-AR", "currency": "ARS" }"#,
    )
    .expect("write");

    let loaded = manager.load().expect("load");
    assert_eq!(loaded.backup_retention, 5);
    assert!(loaded.color);
}

#[test]
fn backups_restore_previous_settings() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path()).expect("manager");
    let original = Config::default();
    let name = manager.backup(&original, Some("Antes del cambio")).expect("backup");
    assert!(name.starts_with("config_"));
    assert!(name.ends_with("_antes-del-cambio.json"));

    let mut changed = original.clone();
    changed.set("color", "off").expect("color");
    manager.save(&changed).expect("save");

    let restored = manager.restore(&name).expect("restore");
    assert!(restored.color);
    assert_eq!(manager.load().expect("load"), original);
    assert_eq!(manager.list_backups().expect("list"), vec![name]);
}

#[test]
fn invalid_values_are_rejected() {
    let mut cfg = Config::default();
    assert!(matches!(
        cfg.set("currency", "pesos"),
        Err(ConfigError::Invalid { .. })
    ));
    assert!(cfg.set("backup_retention", "0").is_err());
    assert!(cfg.set("theme", "dark").is_err());
    assert_eq!(cfg, Config::default());
}
