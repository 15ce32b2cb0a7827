//! Payment methods and people: flat, uniquely named lists per profile.

use cuentas_domain::{EntityId, NamedEntity, PaymentMethod, Person};

use crate::{collection::Record, database::Database, CoreError};

/// A record that is nothing more than an owned name.
pub trait NamedRecord: Record + NamedEntity {
    fn create(user_id: EntityId, name: &str) -> Self;
    fn set_name(&mut self, name: &str);
}

impl NamedRecord for PaymentMethod {
    fn create(user_id: EntityId, name: &str) -> Self {
        PaymentMethod::new(user_id, name)
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

impl NamedRecord for Person {
    fn create(user_id: EntityId, name: &str) -> Self {
        Person::new(user_id, name)
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

/// CRUD shared by the name-only collections.
pub struct LookupService;

impl LookupService {
    pub fn create<T: NamedRecord>(
        db: &Database,
        user_id: &EntityId,
        name: &str,
    ) -> Result<T, CoreError> {
        let name = Self::validate_name::<T>(db, user_id, name, None)?;
        db.repository::<T>().add(T::create(user_id.clone(), &name))
    }

    pub fn list<T: NamedRecord>(db: &Database, user_id: &EntityId) -> Result<Vec<T>, CoreError> {
        let mut items = db.repository::<T>().list(user_id)?;
        items.sort_by_key(|item| item.name().to_lowercase());
        Ok(items)
    }

    pub fn rename<T: NamedRecord>(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        new_name: &str,
    ) -> Result<T, CoreError> {
        let repo = db.repository::<T>();
        repo.get(user_id, id)?
            .ok_or_else(|| CoreError::not_found(T::ENTITY, id))?;
        let name = Self::validate_name::<T>(db, user_id, new_name, Some(id))?;
        repo.update(id, |item| item.set_name(&name))?
            .ok_or_else(|| CoreError::not_found(T::ENTITY, id))
    }

    pub fn remove<T: NamedRecord>(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
    ) -> Result<bool, CoreError> {
        let repo = db.repository::<T>();
        if repo.get(user_id, id)?.is_none() {
            return Ok(false);
        }
        repo.remove(id)
    }

    fn validate_name<T: NamedRecord>(
        db: &Database,
        user_id: &EntityId,
        name: &str,
        ignore: Option<&EntityId>,
    ) -> Result<String, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation(format!(
                "{} name must not be empty",
                T::ENTITY
            )));
        }
        let needle = name.to_lowercase();
        let taken = db.repository::<T>().list(user_id)?.iter().any(|item| {
            Some(item.id()) != ignore && item.name().trim().to_lowercase() == needle
        });
        if taken {
            return Err(CoreError::Validation(format!(
                "{} `{name}` already exists",
                T::ENTITY
            )));
        }
        Ok(name.to_string())
    }
}

pub struct PaymentMethodService;

impl PaymentMethodService {
    pub fn create(db: &Database, user_id: &EntityId, name: &str) -> Result<PaymentMethod, CoreError> {
        LookupService::create(db, user_id, name)
    }

    pub fn list(db: &Database, user_id: &EntityId) -> Result<Vec<PaymentMethod>, CoreError> {
        LookupService::list(db, user_id)
    }

    pub fn rename(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        name: &str,
    ) -> Result<PaymentMethod, CoreError> {
        LookupService::rename(db, user_id, id, name)
    }

    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        LookupService::remove::<PaymentMethod>(db, user_id, id)
    }
}

pub struct PersonService;

impl PersonService {
    pub fn create(db: &Database, user_id: &EntityId, name: &str) -> Result<Person, CoreError> {
        LookupService::create(db, user_id, name)
    }

    pub fn list(db: &Database, user_id: &EntityId) -> Result<Vec<Person>, CoreError> {
        LookupService::list(db, user_id)
    }

    pub fn rename(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        name: &str,
    ) -> Result<Person, CoreError> {
        LookupService::rename(db, user_id, id, name)
    }

    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        LookupService::remove::<Person>(db, user_id, id)
    }
}

#[cfg(test)]
mod tests {
    use cuentas_domain::Identifiable;

    use super::*;

    #[test]
    fn names_are_unique_per_user() {
        let db = Database::in_memory();
        let ana = EntityId::from("ana");
        let beto = EntityId::from("beto");
        PaymentMethodService::create(&db, &ana, "Efectivo").unwrap();
        assert!(PaymentMethodService::create(&db, &ana, "efectivo").is_err());
        PaymentMethodService::create(&db, &beto, "Efectivo").unwrap();
        assert!(PaymentMethodService::create(&db, &ana, "   ").is_err());
    }

    #[test]
    fn people_sort_by_name_and_rename_in_place() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let zoe = PersonService::create(&db, &user, "Zoe").unwrap();
        PersonService::create(&db, &user, "Martín").unwrap();
        let renamed = PersonService::rename(&db, &user, zoe.id(), "Ana").unwrap();
        let names: Vec<_> = PersonService::list(&db, &user)
            .unwrap()
            .into_iter()
            .map(|person| person.name)
            .collect();
        assert_eq!(renamed.name, "Ana");
        assert_eq!(names, vec!["Ana", "Martín"]);
    }

    #[test]
    fn removing_someone_elses_record_is_a_noop() {
        let db = Database::in_memory();
        let method = PaymentMethodService::create(&db, &"ana".into(), "Efectivo").unwrap();
        assert!(!PaymentMethodService::remove(&db, &"beto".into(), &method.id).unwrap());
        assert!(PaymentMethodService::remove(&db, &"ana".into(), &method.id).unwrap());
    }
}
