//! Status enums and event kinds.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `ResolutionStatus` carries the resolver's state machine and provides
//! `allowed_next_states()` so transitions can be checked at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// MembershipTier
// ---------------------------------------------------------------------------

/// Subscription tier of a profile. New profiles always start at the lowest tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[default]
    Free,
    Standard,
    Premium,
}

impl MembershipTier {
    /// The tier assigned to freshly provisioned profiles.
    #[must_use]
    pub const fn lowest() -> Self {
        Self::Free
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// Account status of a profile.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuthEvent
// ---------------------------------------------------------------------------

/// Kind of auth-state change pushed by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialSession => "initial_session",
            Self::SignedIn => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed => "token_refreshed",
            Self::UserUpdated => "user_updated",
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResolutionStatus
// ---------------------------------------------------------------------------

/// Where the identity resolver currently stands.
///
/// ```text
/// initializing → resolved
///              → profile_only
///              → unauthenticated
///              → timed_out
/// (any terminal state) → initializing
/// ```
///
/// Every terminal state re-enters `initializing` when the underlying identity
/// changes or a refresh is requested.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    #[default]
    Initializing,
    /// Profile, chapter and role all resolved.
    Resolved,
    /// Profile resolved, no active primary membership.
    ProfileOnly,
    Unauthenticated,
    TimedOut,
}

impl ResolutionStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Initializing => &[
                Self::Initializing,
                Self::Resolved,
                Self::ProfileOnly,
                Self::Unauthenticated,
                Self::TimedOut,
            ],
            Self::Resolved | Self::ProfileOnly | Self::Unauthenticated | Self::TimedOut => {
                &[Self::Initializing]
            }
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether a resolution cycle has finished in this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Initializing)
    }

    /// Whether an identity is attached in this state.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Resolved | Self::ProfileOnly)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Resolved => "resolved",
            Self::ProfileOnly => "profile_only",
            Self::Unauthenticated => "unauthenticated",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_tier_is_free() {
        assert_eq!(MembershipTier::lowest(), MembershipTier::Free);
        assert_eq!(MembershipTier::default(), MembershipTier::lowest());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ResolutionStatus::ProfileOnly).unwrap();
        assert_eq!(json, "\"profile_only\"");
        let json = serde_json::to_string(&AuthEvent::TokenRefreshed).unwrap();
        assert_eq!(json, "\"token_refreshed\"");
    }

    #[test]
    fn as_str_matches_serde() {
        for status in [
            ResolutionStatus::Initializing,
            ResolutionStatus::Resolved,
            ResolutionStatus::ProfileOnly,
            ResolutionStatus::Unauthenticated,
            ResolutionStatus::TimedOut,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn terminal_states_only_reenter_initializing() {
        for status in [
            ResolutionStatus::Resolved,
            ResolutionStatus::ProfileOnly,
            ResolutionStatus::Unauthenticated,
            ResolutionStatus::TimedOut,
        ] {
            assert!(status.is_terminal());
            assert!(status.can_transition_to(ResolutionStatus::Initializing));
            assert!(!status.can_transition_to(ResolutionStatus::Resolved));
        }
    }

    #[test]
    fn initializing_reaches_every_state() {
        let from = ResolutionStatus::Initializing;
        assert!(!from.is_terminal());
        assert!(from.can_transition_to(ResolutionStatus::Resolved));
        assert!(from.can_transition_to(ResolutionStatus::TimedOut));
        assert!(from.can_transition_to(ResolutionStatus::Initializing));
    }

    #[test]
    fn only_resolved_states_are_authenticated() {
        assert!(ResolutionStatus::Resolved.is_authenticated());
        assert!(ResolutionStatus::ProfileOnly.is_authenticated());
        assert!(!ResolutionStatus::TimedOut.is_authenticated());
        assert!(!ResolutionStatus::Unauthenticated.is_authenticated());
    }
}
