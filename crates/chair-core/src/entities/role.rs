use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const ROLE_SOCIAL_CHAIR: &str = "Social Chair";
pub const ROLE_MEMBER: &str = "Member";

/// Named permission bucket. The set of roles is closed: rows are maintained by
/// the backend and never created by clients.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}
