use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{MembershipTier, UserStatus};

/// Application-level user record. `id` is always the identity provider's
/// subject id for the same person.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tier: MembershipTier,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// `"First Last"`, trimmed when either half is missing.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
