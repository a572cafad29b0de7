use chair_core::enums::AuthEvent;
use chair_core::identity::AuthIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before expiry at which a session is treated as expired and refreshed.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// A live session issued by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: AuthIdentity,
}

impl AuthSession {
    /// Check if the session is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at <= threshold
    }

    /// The persisted form kept in the token store.
    #[must_use]
    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            access_token: self.access_token.clone(),
            refresh_token: Some(self.refresh_token.clone()),
            expires_at: Some(self.expires_at),
        }
    }
}

/// What the token store persists between process runs.
///
/// A token supplied through the environment carries no refresh token and,
/// unless it is a JWT, no known expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    /// A bare access token with no refresh token or expiry.
    #[must_use]
    pub fn bare(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|at| at <= Utc::now() + chrono::TimeDelta::seconds(buffer_secs))
    }
}

/// Auth-state change pushed by a provider to its subscribers.
#[derive(Debug, Clone)]
pub struct AuthNotification {
    pub event: AuthEvent,
    /// `None` for [`AuthEvent::SignedOut`].
    pub session: Option<AuthSession>,
}

impl AuthNotification {
    #[must_use]
    pub fn identity(&self) -> Option<&AuthIdentity> {
        self.session.as_ref().map(|session| &session.identity)
    }
}

/// Result of a successful sign-up call.
///
/// `session` is `None` when the provider holds the identity until its email
/// address is confirmed.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    pub identity: AuthIdentity,
    pub session: Option<AuthSession>,
}

impl SignUpResponse {
    #[must_use]
    pub const fn needs_confirmation(&self) -> bool {
        self.session.is_none()
    }
}
