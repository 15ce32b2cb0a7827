use tracing::info;

use cuentas_domain::{Attachment, EntityId, Folder};

use crate::{database::Database, CoreError};

pub struct FolderService;

impl FolderService {
    pub fn create(db: &Database, user_id: &EntityId, name: &str) -> Result<Folder, CoreError> {
        let name = Self::clean_name(name)?;
        db.repository::<Folder>()
            .add(Folder::new(user_id.clone(), name))
    }

    pub fn list(db: &Database, user_id: &EntityId) -> Result<Vec<Folder>, CoreError> {
        let mut folders = db.repository::<Folder>().list(user_id)?;
        folders.sort_by_key(|folder| folder.name.to_lowercase());
        Ok(folders)
    }

    pub fn get(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<Folder, CoreError> {
        db.repository::<Folder>()
            .get(user_id, id)?
            .ok_or_else(|| CoreError::not_found("Folder", id))
    }

    pub fn rename(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        name: &str,
    ) -> Result<Folder, CoreError> {
        let name = Self::clean_name(name)?;
        Self::get(db, user_id, id)?;
        db.repository::<Folder>()
            .update(id, |folder| folder.name = name.clone())?
            .ok_or_else(|| CoreError::not_found("Folder", id))
    }

    /// Deletes a folder. Its attachments move back to the root first, so
    /// none are lost.
    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        if db.repository::<Folder>().get(user_id, id)?.is_none() {
            return Ok(false);
        }
        let moved = db.repository::<Attachment>().update_where(
            |attachment| attachment.folder_id.as_ref() == Some(id),
            |attachment| attachment.folder_id = None,
        )?;
        let removed = db.repository::<Folder>().remove(id)?;
        info!(folder = %id, moved, "folder removed");
        Ok(removed)
    }

    fn clean_name(name: &str) -> Result<String, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("folder name must not be empty".into()));
        }
        Ok(name.to_string())
    }
}
