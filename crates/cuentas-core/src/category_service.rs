use cuentas_domain::{Category, EntityId, TransactionKind};

use crate::{database::Database, CoreError};

pub struct CategoryService;

impl CategoryService {
    /// Adds a category, rejecting blank names and case-insensitive duplicates
    /// of the same kind.
    pub fn create(
        db: &Database,
        user_id: &EntityId,
        name: &str,
        kind: TransactionKind,
    ) -> Result<Category, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("category name must not be empty".into()));
        }
        let repo = db.repository::<Category>();
        if repo
            .list(user_id)?
            .iter()
            .any(|category| category.same_slot(name, kind))
        {
            return Err(CoreError::Validation(format!(
                "category `{name}` already exists for {}",
                kind.as_str()
            )));
        }
        repo.add(Category::new(user_id.clone(), name, kind))
    }

    /// Sorted by name; `kind` narrows to income or expense categories.
    pub fn list(
        db: &Database,
        user_id: &EntityId,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>, CoreError> {
        let mut categories = db
            .repository::<Category>()
            .list_where(user_id, |category| kind.map_or(true, |kind| category.kind == kind))?;
        categories.sort_by_key(|category| category.name.to_lowercase());
        Ok(categories)
    }

    pub fn rename(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        new_name: &str,
    ) -> Result<Category, CoreError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(CoreError::Validation("category name must not be empty".into()));
        }
        let repo = db.repository::<Category>();
        let current = repo
            .get(user_id, id)?
            .ok_or_else(|| CoreError::not_found("Category", id))?;
        let taken = repo.list(user_id)?.iter().any(|category| {
            category.id != current.id && category.same_slot(new_name, current.kind)
        });
        if taken {
            return Err(CoreError::Validation(format!(
                "category `{new_name}` already exists"
            )));
        }
        repo.update(id, |category| category.name = new_name.to_string())?
            .ok_or_else(|| CoreError::not_found("Category", id))
    }

    /// Transactions keep their category name after the category is removed.
    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        let repo = db.repository::<Category>();
        if repo.get(user_id, id)?.is_none() {
            return Ok(false);
        }
        repo.remove(id)
    }

    pub fn find_by_name(
        db: &Database,
        user_id: &EntityId,
        name: &str,
    ) -> Result<Option<Category>, CoreError> {
        let needle = name.trim().to_lowercase();
        Ok(db
            .repository::<Category>()
            .list(user_id)?
            .into_iter()
            .find(|category| category.name.to_lowercase() == needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_per_kind() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        CategoryService::create(&db, &user, "Otros", TransactionKind::Expense).unwrap();
        let err =
            CategoryService::create(&db, &user, " otros ", TransactionKind::Expense).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        CategoryService::create(&db, &user, "Otros", TransactionKind::Income).unwrap();
        assert_eq!(CategoryService::list(&db, &user, None).unwrap().len(), 2);
    }

    #[test]
    fn list_sorts_and_filters_by_kind() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        for name in ["Transporte", "alimentación", "Salud"] {
            CategoryService::create(&db, &user, name, TransactionKind::Expense).unwrap();
        }
        CategoryService::create(&db, &user, "Sueldo", TransactionKind::Income).unwrap();

        let names: Vec<_> = CategoryService::list(&db, &user, Some(TransactionKind::Expense))
            .unwrap()
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["alimentación", "Salud", "Transporte"]);
    }

    #[test]
    fn rename_refuses_collisions() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let food = CategoryService::create(&db, &user, "Comida", TransactionKind::Expense).unwrap();
        CategoryService::create(&db, &user, "Salud", TransactionKind::Expense).unwrap();
        assert!(CategoryService::rename(&db, &user, &food.id, "SALUD").is_err());
        let renamed = CategoryService::rename(&db, &user, &food.id, "Supermercado").unwrap();
        assert_eq!(renamed.name, "Supermercado");
    }
}
