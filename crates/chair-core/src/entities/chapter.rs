use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An organizational unit (one school's chapter of one organization).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub school_name: String,
    pub organization_name: String,
    pub chapter_code: String,
    pub created_at: DateTime<Utc>,
}

impl Chapter {
    #[must_use]
    pub fn key(&self) -> ChapterKey {
        ChapterKey {
            school: self.school_name.clone(),
            organization: self.organization_name.clone(),
            chapter_code: self.chapter_code.clone(),
        }
    }
}

/// Natural key a chapter is looked up by during provisioning.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct ChapterKey {
    pub school: String,
    pub organization: String,
    pub chapter_code: String,
}
