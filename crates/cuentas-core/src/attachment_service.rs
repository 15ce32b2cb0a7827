//! Receipt uploads, including the fallback path taken when the store is full.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{info, warn};

use cuentas_domain::{is_accepted_file_type, Attachment, EntityId, Folder, ACCEPTED_FILE_TYPES};

use crate::{
    collection::{mutate_collection, Mutation, Record},
    database::Database,
    transaction_service::TransactionService,
    CoreError,
};

/// A file as handed over by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub file_type: String,
    pub bytes: Vec<u8>,
    pub folder_id: Option<EntityId>,
    pub description: Option<String>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, file_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            file_type: file_type.into(),
            bytes,
            folder_id: None,
            description: None,
        }
    }

    pub fn in_folder(mut self, folder_id: EntityId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `data:<mime>;base64,<payload>` values as kept in `fileData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::Validation("not a base64 data URL".into());
        let rest = raw.strip_prefix("data:").ok_or_else(invalid)?;
        let (mime, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|err| CoreError::Validation(format!("invalid base64 payload: {err}")))?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecompressOptions {
    pub quality: f32,
    pub max_width: u32,
}

/// Settings used for the second attempt after the store reports it is full.
pub const FALLBACK_RECOMPRESSION: RecompressOptions = RecompressOptions {
    quality: 0.3,
    max_width: 800,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Recompressed {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Produces a smaller rendition of an image, or declines with `None`.
pub trait Recompressor {
    fn recompress(
        &self,
        file_type: &str,
        bytes: &[u8],
        options: RecompressOptions,
    ) -> Option<Recompressed>;
}

/// Never recompresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecompression;

impl Recompressor for NoRecompression {
    fn recompress(&self, _: &str, _: &[u8], _: RecompressOptions) -> Option<Recompressed> {
        None
    }
}

/// Which attempt finally stored the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Stored,
    Recompressed,
    AfterEviction,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub attachment: Attachment,
    pub step: UploadStep,
    /// Attachments dropped to make room, oldest first.
    pub evicted: Vec<EntityId>,
}

/// Which attachments a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderScope {
    All,
    Root,
    Folder(EntityId),
}

impl FolderScope {
    pub fn contains(&self, attachment: &Attachment) -> bool {
        match self {
            FolderScope::All => true,
            FolderScope::Root => attachment.folder_id.is_none(),
            FolderScope::Folder(id) => attachment.folder_id.as_ref() == Some(id),
        }
    }
}

/// How many of `total` attachments to drop when making room.
pub fn eviction_count(total: usize) -> usize {
    (total * 3 / 10).max(3)
}

pub struct AttachmentService;

impl AttachmentService {
    /// Stores an upload. On a full store, an image is recompressed and retried;
    /// failing that, the oldest attachments are evicted and the write is retried
    /// once more.
    pub fn upload(
        db: &Database,
        user_id: &EntityId,
        upload: Upload,
        recompressor: &dyn Recompressor,
    ) -> Result<UploadOutcome, CoreError> {
        let mut attachment = Self::prepare(db, user_id, &upload)?;

        match Self::store(db, &attachment) {
            Ok(stored) => return Ok(Self::outcome(stored, UploadStep::Stored, Vec::new())),
            Err(err) if err.is_quota_exceeded() => {
                warn!(file = %upload.filename, error = %err, "store full, attempting fallback");
            }
            Err(err) => return Err(err),
        }

        if attachment.is_image() {
            if let Some(smaller) =
                recompressor.recompress(&upload.file_type, &upload.bytes, FALLBACK_RECOMPRESSION)
            {
                attachment.file_data = Some(DataUrl::encode(&smaller.mime, &smaller.bytes));
                match Self::store(db, &attachment) {
                    Ok(stored) => {
                        return Ok(Self::outcome(stored, UploadStep::Recompressed, Vec::new()))
                    }
                    Err(err) if err.is_quota_exceeded() => {}
                    Err(err) => return Err(err),
                }
            }
        }

        let evicted = Self::evict_oldest(db)?;
        warn!(count = evicted.len(), "evicted old attachments to make room");
        let stored = Self::store(db, &attachment)?;
        Ok(Self::outcome(stored, UploadStep::AfterEviction, evicted))
    }

    /// Newest first, narrowed by folder and by a case-insensitive search over
    /// filename and description.
    pub fn list(
        db: &Database,
        user_id: &EntityId,
        scope: &FolderScope,
        search: Option<&str>,
    ) -> Result<Vec<Attachment>, CoreError> {
        let term = search
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());
        let mut items = db.repository::<Attachment>().list_where(user_id, |attachment| {
            scope.contains(attachment)
                && term.as_deref().map_or(true, |term| {
                    attachment.filename.to_lowercase().contains(term)
                        || attachment
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(term))
                })
        })?;
        items.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(items)
    }

    pub fn get(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<Attachment, CoreError> {
        db.repository::<Attachment>()
            .get(user_id, id)?
            .ok_or_else(|| CoreError::not_found("Attachment", id))
    }

    /// Moves an attachment into `folder_id`, or to the root with `None`.
    pub fn move_to_folder(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        folder_id: Option<&EntityId>,
    ) -> Result<Attachment, CoreError> {
        Self::get(db, user_id, id)?;
        if let Some(folder_id) = folder_id {
            Self::require_folder(db, user_id, folder_id)?;
        }
        let target = folder_id.cloned();
        db.repository::<Attachment>()
            .update(id, |attachment| attachment.folder_id = target.clone())?
            .ok_or_else(|| CoreError::not_found("Attachment", id))
    }

    pub fn update_description(
        db: &Database,
        user_id: &EntityId,
        id: &EntityId,
        description: Option<&str>,
    ) -> Result<Attachment, CoreError> {
        Self::get(db, user_id, id)?;
        let description = description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        db.repository::<Attachment>()
            .update(id, |attachment| attachment.description = description.clone())?
            .ok_or_else(|| CoreError::not_found("Attachment", id))
    }

    /// Deletes an attachment and unlinks it from any transaction.
    pub fn remove(db: &Database, user_id: &EntityId, id: &EntityId) -> Result<bool, CoreError> {
        if db.repository::<Attachment>().get(user_id, id)?.is_none() {
            return Ok(false);
        }
        TransactionService::clear_receipts(db, std::slice::from_ref(id))?;
        db.repository::<Attachment>().remove(id)
    }

    fn prepare(db: &Database, user_id: &EntityId, upload: &Upload) -> Result<Attachment, CoreError> {
        let filename = upload.filename.trim();
        if filename.is_empty() {
            return Err(CoreError::Validation("a file name is required".into()));
        }
        if !is_accepted_file_type(&upload.file_type) {
            return Err(CoreError::Validation(format!(
                "unsupported file type `{}` (accepted: {})",
                upload.file_type,
                ACCEPTED_FILE_TYPES.join(", ")
            )));
        }
        if let Some(folder_id) = &upload.folder_id {
            Self::require_folder(db, user_id, folder_id)?;
        }
        let mut attachment = Attachment::new(
            user_id.clone(),
            filename,
            upload.file_type.clone(),
            DataUrl::encode(&upload.file_type, &upload.bytes),
        );
        attachment.folder_id = upload.folder_id.clone();
        attachment.description = upload
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        attachment.date = db.now();
        Ok(attachment)
    }

    fn store(db: &Database, attachment: &Attachment) -> Result<Attachment, CoreError> {
        db.repository::<Attachment>().add(attachment.clone())
    }

    fn outcome(attachment: Attachment, step: UploadStep, evicted: Vec<EntityId>) -> UploadOutcome {
        info!(id = %attachment.id, ?step, "attachment stored");
        UploadOutcome {
            attachment,
            step,
            evicted,
        }
    }

    /// Drops the oldest attachments across the whole collection and clears
    /// transaction links to them.
    fn evict_oldest(db: &Database) -> Result<Vec<EntityId>, CoreError> {
        let evicted = mutate_collection(db.store(), Attachment::KEY, |items: &mut Vec<Attachment>| {
            if items.is_empty() {
                return Ok(Mutation::Skip(Vec::new()));
            }
            items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            let count = eviction_count(items.len()).min(items.len());
            let dropped: Vec<EntityId> = items.drain(..count).map(|item| item.id).collect();
            Ok(Mutation::Commit(dropped))
        })?;
        TransactionService::clear_receipts(db, &evicted)?;
        Ok(evicted)
    }

    fn require_folder(
        db: &Database,
        user_id: &EntityId,
        folder_id: &EntityId,
    ) -> Result<Folder, CoreError> {
        db.repository::<Folder>()
            .get(user_id, folder_id)?
            .ok_or_else(|| CoreError::not_found("Folder", folder_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_round_trip() {
        let encoded = DataUrl::encode("image/png", b"\x89PNG");
        assert!(encoded.starts_with("data:image/png;base64,"));
        let decoded = DataUrl::parse(&encoded).unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, b"\x89PNG");
        assert!(DataUrl::parse("https://example.com/a.png").is_err());
    }

    #[test]
    fn eviction_drops_at_least_three() {
        assert_eq!(eviction_count(1), 3);
        assert_eq!(eviction_count(10), 3);
        assert_eq!(eviction_count(20), 6);
        assert_eq!(eviction_count(25), 7);
    }

    #[test]
    fn rejects_unsupported_types_and_missing_folders() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let gif = Upload::new("a.gif", "image/gif", vec![1, 2, 3]);
        assert!(matches!(
            AttachmentService::upload(&db, &user, gif, &NoRecompression),
            Err(CoreError::Validation(_))
        ));
        let orphan = Upload::new("a.pdf", "application/pdf", vec![1]).in_folder("nope".into());
        assert!(matches!(
            AttachmentService::upload(&db, &user, orphan, &NoRecompression),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_scopes_by_folder_and_search() {
        let db = Database::in_memory();
        let user = EntityId::from("ana");
        let folder = crate::FolderService::create(&db, &user, "Impuestos").unwrap();
        let upload = |name: &str| Upload::new(name, "application/pdf", vec![0u8; 4]);
        AttachmentService::upload(&db, &user, upload("luz.pdf").described("Edenor marzo"), &NoRecompression).unwrap();
        AttachmentService::upload(&db, &user, upload("abl.pdf").in_folder(folder.id.clone()), &NoRecompression).unwrap();

        let root = AttachmentService::list(&db, &user, &FolderScope::Root, None).unwrap();
        assert_eq!(root.len(), 1);
        let in_folder =
            AttachmentService::list(&db, &user, &FolderScope::Folder(folder.id.clone()), None).unwrap();
        assert_eq!(in_folder[0].filename, "abl.pdf");
        let found = AttachmentService::list(&db, &user, &FolderScope::All, Some("edenor")).unwrap();
        assert_eq!(found[0].filename, "luz.pdf");
    }
}
