//! Receipts ("comprobantes") and the folders that group them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

pub const ACCEPTED_FILE_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
];

/// An uploaded receipt. The payload lives inline as a base64 data URL, or
/// elsewhere behind `file_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    #[serde(alias = "file_name")]
    pub filename: String,
    #[serde(alias = "file_type")]
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(default, alias = "file_url", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, alias = "folder_id")]
    pub folder_id: Option<EntityId>,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Attachment {
    pub fn new(
        user_id: EntityId,
        filename: impl Into<String>,
        file_type: impl Into<String>,
        file_data: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            user_id,
            filename: filename.into(),
            file_type: file_type.into(),
            file_data: Some(file_data),
            file_url: None,
            folder_id: None,
            description: None,
            date: now,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }

    /// Bytes used by the inline payload, as stored text.
    pub fn payload_len(&self) -> usize {
        self.file_data.as_ref().map(String::len).unwrap_or(0)
    }
}

pub fn is_accepted_file_type(file_type: &str) -> bool {
    ACCEPTED_FILE_TYPES.contains(&file_type)
}

impl Identifiable for Attachment {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Owned for Attachment {
    fn user_id(&self) -> &EntityId {
        &self.user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: EntityId,
    #[serde(default, alias = "user_id")]
    pub user_id: EntityId,
    pub name: String,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Folder {
    pub fn new(user_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            user_id,
            name: name.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

impl Identifiable for Folder {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Owned for Folder {
    fn user_id(&self) -> &EntityId {
        &self.user_id
    }
}

impl NamedEntity for Folder {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_pdf_and_common_images() {
        assert!(is_accepted_file_type("image/png"));
        assert!(is_accepted_file_type("application/pdf"));
        assert!(!is_accepted_file_type("image/gif"));
        assert!(!is_accepted_file_type("text/plain"));
    }

    #[test]
    fn root_attachments_serialize_null_folder() {
        let attachment = Attachment::new("u1".into(), "ticket.png", "image/png", "data:".into());
        let value = serde_json::to_value(&attachment).unwrap();
        assert!(value["folderId"].is_null());
        assert_eq!(value["fileType"], "image/png");
    }
}
