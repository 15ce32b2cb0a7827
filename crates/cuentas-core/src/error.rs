use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Profile already exists: {0}")]
    DuplicateProfile(String),
    #[error("No profile is signed in")]
    NotSignedIn,
    #[error("Concurrent update conflict on `{key}`")]
    Conflict { key: String },
    #[error("Storage quota exceeded writing `{key}`: needs {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: u64,
        available: u64,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, CoreError::QuotaExceeded { .. })
    }
}
