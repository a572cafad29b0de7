use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Chapter, MembershipLink, Profile, Role};

/// Metadata captured at sign-up and stored by the identity provider alongside
/// the identity. Read back when a deferred-confirmation profile is provisioned.
///
/// Every field is optional on the wire and defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignupMetadata {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub chapter_code: String,
    #[serde(default)]
    pub role_name: String,
}

impl SignupMetadata {
    /// True when the provider returned no usable metadata at all.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.school.is_empty()
            && self.organization.is_empty()
            && self.chapter_code.is_empty()
            && self.role_name.is_empty()
    }
}

/// Identity issued by the external identity provider.
///
/// Produced by `chair-auth`, consumed by `chair-session`. Contains only data
/// fields — no provider calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthIdentity {
    /// Provider subject id. Profiles are keyed by this value.
    pub id: String,
    pub email: String,
    /// `None` while the email address awaits confirmation.
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: SignupMetadata,
}

impl AuthIdentity {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// The derived `{profile, chapter, role}` view exposed to the rest of the
/// application. Never persisted; rebuilt from scratch on every resolution cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedIdentity {
    pub profile: Option<Profile>,
    pub chapter: Option<Chapter>,
    pub role: Option<Role>,
    pub membership: Option<MembershipLink>,
}

impl ResolvedIdentity {
    /// A profile without any chapter or role.
    #[must_use]
    pub const fn profile_only(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            chapter: None,
            role: None,
            membership: None,
        }
    }

    #[must_use]
    pub const fn full(
        profile: Profile,
        chapter: Chapter,
        role: Role,
        membership: MembershipLink,
    ) -> Self {
        Self {
            profile: Some(profile),
            chapter: Some(chapter),
            role: Some(role),
            membership: Some(membership),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self.chapter.is_none()
            && self.role.is_none()
            && self.membership.is_none()
    }

    /// Profile, chapter, role and membership are all present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.profile.is_some()
            && self.chapter.is_some()
            && self.role.is_some()
            && self.membership.is_some()
    }

    /// Whether the resolved role carries the given name (exact match).
    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.role.as_ref().is_some_and(|role| role.name == name)
    }
}
