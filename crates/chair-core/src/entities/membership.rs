use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Chapter, Role};

/// Join row connecting a profile to a chapter under a role.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MembershipLink {
    pub id: String,
    pub user_id: String,
    pub chapter_id: String,
    pub role_id: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A membership link read together with its chapter and role.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MembershipDetails {
    pub link: MembershipLink,
    pub chapter: Chapter,
    pub role: Role,
}
