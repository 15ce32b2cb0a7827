//! Profile sign-in state, kept in the `currentUser` key.

use tracing::info;

use cuentas_domain::{
    Category, EntityId, PaymentMethod, Profile, Settings, TransactionKind, DEFAULT_PROFILE_TYPE,
};

use crate::{
    collection::{get_collection, get_value, keys, mutate_collection, set_value, Mutation, Record},
    database::Database,
    settings_service::SettingsService,
    CoreError,
};

pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Alimentación",
    "Transporte",
    "Vivienda",
    "Salud",
    "Entretenimiento",
];
pub const DEFAULT_INCOME_CATEGORIES: &[&str] = &["Sueldo", "Freelance", "Otros ingresos"];
pub const DEFAULT_PAYMENT_METHODS: &[&str] = &[
    "Efectivo",
    "Tarjeta de débito",
    "Tarjeta de crédito",
    "Transferencia",
];

#[derive(Debug, Clone)]
pub struct Session {
    db: Database,
}

impl Session {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn current(&self) -> Result<Option<Profile>, CoreError> {
        get_value(self.db.store(), keys::CURRENT_USER)
    }

    /// The signed-in profile, or [`CoreError::NotSignedIn`].
    pub fn require_user(&self) -> Result<Profile, CoreError> {
        self.current()?.ok_or(CoreError::NotSignedIn)
    }

    pub fn profiles(&self) -> Result<Vec<Profile>, CoreError> {
        Ok(get_collection(self.db.store(), keys::USERS)?.items)
    }

    pub fn find_profile(&self, username: &str) -> Result<Option<Profile>, CoreError> {
        Ok(self
            .profiles()?
            .into_iter()
            .find(|profile| profile.matches_username(username)))
    }

    /// Signs in as `username`, creating the profile when it does not exist.
    pub fn sign_in(&self, username: &str, profile_type: Option<&str>) -> Result<Profile, CoreError> {
        if username.trim().is_empty() {
            return Err(CoreError::Validation("username must not be empty".into()));
        }
        match self.find_profile(username)? {
            Some(profile) => {
                self.set_current(&profile)?;
                info!(username = %profile.username, "signed in");
                Ok(profile)
            }
            None => self.register_profile(username, profile_type.unwrap_or(DEFAULT_PROFILE_TYPE)),
        }
    }

    /// Creates a profile, signs it in, and seeds its settings, categories, and
    /// payment methods.
    pub fn register_profile(&self, username: &str, profile_type: &str) -> Result<Profile, CoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::Validation("username must not be empty".into()));
        }
        let profile_type = match profile_type.trim() {
            "" => DEFAULT_PROFILE_TYPE,
            other => other,
        };
        let mut profile = Profile::new(username, profile_type);
        profile.created_at = self.db.now();

        mutate_collection(self.db.store(), keys::USERS, |profiles: &mut Vec<Profile>| {
            if profiles.iter().any(|existing| existing.matches_username(username)) {
                return Err(CoreError::DuplicateProfile(username.to_string()));
            }
            profiles.push(profile.clone());
            Ok(Mutation::Commit(()))
        })?;
        self.set_current(&profile)?;
        SettingsService::save(&self.db, &Settings::defaults_for(profile.id.clone()))?;
        self.seed_defaults(&profile.id)?;
        info!(username = %profile.username, id = %profile.id, "profile registered");
        Ok(profile)
    }

    /// Switches to an existing profile only.
    pub fn switch_profile(&self, username: &str) -> Result<Profile, CoreError> {
        let profile = self
            .find_profile(username)?
            .ok_or_else(|| CoreError::not_found("Profile", username))?;
        self.set_current(&profile)?;
        info!(username = %profile.username, "switched profile");
        Ok(profile)
    }

    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.db.store().delete(keys::CURRENT_USER)?;
        info!("signed out");
        Ok(())
    }

    /// Removes the profile record only; data it owns in other collections stays.
    pub fn delete_profile(&self, user_id: &EntityId) -> Result<bool, CoreError> {
        let removed = mutate_collection(self.db.store(), keys::USERS, |profiles: &mut Vec<Profile>| {
            let before = profiles.len();
            profiles.retain(|profile| &profile.id != user_id);
            Ok(if profiles.len() == before {
                Mutation::Skip(false)
            } else {
                Mutation::Commit(true)
            })
        })?;
        if self
            .current()?
            .is_some_and(|current| &current.id == user_id)
        {
            self.sign_out()?;
        }
        if removed {
            info!(id = %user_id, "profile deleted");
        }
        Ok(removed)
    }

    fn set_current(&self, profile: &Profile) -> Result<(), CoreError> {
        set_value(self.db.store(), keys::CURRENT_USER, profile)
    }

    fn seed_defaults(&self, user_id: &EntityId) -> Result<(), CoreError> {
        let now = self.db.now();
        let categories = DEFAULT_EXPENSE_CATEGORIES
            .iter()
            .map(|name| (name, TransactionKind::Expense))
            .chain(
                DEFAULT_INCOME_CATEGORIES
                    .iter()
                    .map(|name| (name, TransactionKind::Income)),
            )
            .map(|(name, kind)| {
                let mut category = Category::new(user_id.clone(), *name, kind);
                category.stamp_created(now);
                category
            })
            .collect::<Vec<_>>();
        append(&self.db, categories)?;

        let methods = DEFAULT_PAYMENT_METHODS
            .iter()
            .map(|name| {
                let mut method = PaymentMethod::new(user_id.clone(), *name);
                method.stamp_created(now);
                method
            })
            .collect::<Vec<_>>();
        append(&self.db, methods)
    }
}

fn append<T: Record>(db: &Database, records: Vec<T>) -> Result<(), CoreError> {
    mutate_collection(db.store(), T::KEY, |items: &mut Vec<T>| {
        items.extend(records.iter().cloned());
        Ok(Mutation::Commit(()))
    })
}
