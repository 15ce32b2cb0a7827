//! Local user profiles. There are no passwords; a profile is just a name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

pub const DEFAULT_PROFILE_TYPE: &str = "personal";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: EntityId,
    pub username: String,
    #[serde(default = "default_profile_type", alias = "profile_type")]
    pub profile_type: String,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(username: impl Into<String>, profile_type: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            username: username.into(),
            profile_type: profile_type.into(),
            created_at: Utc::now(),
        }
    }

    /// Usernames are unique ignoring case.
    pub fn matches_username(&self, candidate: &str) -> bool {
        self.username.to_lowercase() == candidate.trim().to_lowercase()
    }
}

fn default_profile_type() -> String {
    DEFAULT_PROFILE_TYPE.into()
}

impl Identifiable for Profile {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Profile {
    fn name(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_match_ignores_case() {
        let profile = Profile::new("Ana", DEFAULT_PROFILE_TYPE);
        assert!(profile.matches_username("ANA"));
        assert!(profile.matches_username(" ana "));
        assert!(!profile.matches_username("anabel"));
    }

    #[test]
    fn reads_profiles_without_type() {
        let json = r#"{"id":"1700000000000","username":"ana","createdAt":"2024-01-02T03:04:05.000Z"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.profile_type, "personal");
    }
}
