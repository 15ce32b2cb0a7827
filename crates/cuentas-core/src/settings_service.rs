use tracing::debug;

use cuentas_domain::{EntityId, Settings};

use crate::{
    collection::{get_value, set_value},
    database::Database,
    CoreError,
};

pub struct SettingsService;

impl SettingsService {
    /// Loads the user's settings, writing defaults when none (or unreadable
    /// ones) are stored.
    pub fn load(db: &Database, user_id: &EntityId) -> Result<Settings, CoreError> {
        let key = Settings::storage_key(user_id);
        if let Some(settings) = get_value::<Settings>(db.store(), &key)? {
            return Ok(settings);
        }
        debug!(%user_id, "writing default settings");
        let settings = Settings::defaults_for(user_id.clone());
        set_value(db.store(), &key, &settings)?;
        Ok(settings)
    }

    pub fn save(db: &Database, settings: &Settings) -> Result<(), CoreError> {
        set_value(db.store(), &Settings::storage_key(&settings.user_id), settings)
    }

    /// Loads, edits, and saves in one step.
    pub fn update<F>(db: &Database, user_id: &EntityId, edit: F) -> Result<Settings, CoreError>
    where
        F: FnOnce(&mut Settings) -> Result<(), CoreError>,
    {
        let mut settings = Self::load(db, user_id)?;
        edit(&mut settings)?;
        settings.user_id = user_id.clone();
        Self::save(db, &settings)?;
        Ok(settings)
    }

    pub fn add_person(db: &Database, user_id: &EntityId, name: &str) -> Result<Settings, CoreError> {
        let name = name.trim().to_string();
        Self::update(db, user_id, |settings| {
            if name.is_empty() {
                return Err(CoreError::Validation("person name must not be empty".into()));
            }
            if settings.has_person(&name) {
                return Err(CoreError::Validation(format!("`{name}` is already listed")));
            }
            settings.people.push(name);
            Ok(())
        })
    }

    pub fn remove_person(
        db: &Database,
        user_id: &EntityId,
        name: &str,
    ) -> Result<Settings, CoreError> {
        let name = name.trim();
        Self::update(db, user_id, |settings| {
            settings.people.retain(|person| person != name);
            Ok(())
        })
    }

    pub fn set_currency(
        db: &Database,
        user_id: &EntityId,
        currency: &str,
    ) -> Result<Settings, CoreError> {
        let currency = currency.trim().to_uppercase();
        Self::update(db, user_id, |settings| {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::Validation(format!(
                    "`{currency}` is not a three-letter currency code"
                )));
            }
            settings.currency = currency;
            Ok(())
        })
    }

    pub fn set_dark_mode(db: &Database, user_id: &EntityId, on: bool) -> Result<Settings, CoreError> {
        Self::update(db, user_id, |settings| {
            settings.dark_mode = on;
            Ok(())
        })
    }

    pub fn set_live_with_others(
        db: &Database,
        user_id: &EntityId,
        on: bool,
    ) -> Result<Settings, CoreError> {
        Self::update(db, user_id, |settings| {
            settings.live_with_others = on;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_persists_defaults() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let settings = SettingsService::load(&db, &user).unwrap();
        assert_eq!(settings.currency, "ARS");
        assert!(db.store().get("config_ana").unwrap().is_some());
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        let db = Database::in_memory();
        db.store().put("config_ana", "nope", None).unwrap();
        let settings = SettingsService::load(&db, &"ana".into()).unwrap();
        assert!(settings.dark_mode);
    }

    #[test]
    fn people_are_trimmed_and_unique() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        SettingsService::add_person(&db, &user, " Juan ").unwrap();
        assert!(SettingsService::add_person(&db, &user, "Juan").is_err());
        assert!(SettingsService::add_person(&db, &user, "  ").is_err());
        let settings = SettingsService::remove_person(&db, &user, "Juan").unwrap();
        assert!(settings.people.is_empty());
    }

    #[test]
    fn currency_must_be_a_code() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        assert_eq!(SettingsService::set_currency(&db, &user, "usd").unwrap().currency, "USD");
        assert!(SettingsService::set_currency(&db, &user, "dollars").is_err());
    }
}
