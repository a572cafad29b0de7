//! Human-readable text for auth failures shown at sign-in and sign-up.

use chair_auth::AuthError;
use serde::Serialize;
use thiserror::Error;

/// Provider messages that mean the project itself is misconfigured, not that
/// the user did anything wrong.
const MISCONFIGURATION_MARKERS: [&str; 2] = ["Database error saving new user", "Invalid API key"];

pub const CONTACT_SUPPORT: &str =
    "We couldn't set up your account because of a server configuration problem. Please contact support.";

pub const EMAIL_NOT_CONFIRMED: &str =
    "Please confirm your email address before signing in. Check your inbox for the confirmation link.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidCredentials,
    EmailNotConfirmed,
    DuplicateEmail,
    WeakPassword,
    InvalidEmail,
    Misconfigured,
    Rejected,
    Unavailable,
}

/// A sign-in or sign-up failure, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct AuthFailure {
    pub kind: FailureKind,
    pub message: String,
}

fn is_misconfiguration(raw: &str) -> bool {
    MISCONFIGURATION_MARKERS
        .iter()
        .any(|marker| raw.contains(marker))
}

/// Classify a provider error.
#[must_use]
pub fn classify(error: &AuthError) -> FailureKind {
    if is_misconfiguration(&error.to_string()) {
        return FailureKind::Misconfigured;
    }
    match error {
        AuthError::InvalidCredentials => FailureKind::InvalidCredentials,
        AuthError::EmailNotConfirmed => FailureKind::EmailNotConfirmed,
        AuthError::DuplicateEmail => FailureKind::DuplicateEmail,
        AuthError::WeakPassword(_) => FailureKind::WeakPassword,
        AuthError::InvalidEmail => FailureKind::InvalidEmail,
        AuthError::Provider(_) => FailureKind::Rejected,
        _ => FailureKind::Unavailable,
    }
}

/// The message to show for a provider error.
#[must_use]
pub fn describe(error: &AuthError) -> String {
    match classify(error) {
        FailureKind::Misconfigured => CONTACT_SUPPORT.to_string(),
        FailureKind::EmailNotConfirmed => EMAIL_NOT_CONFIRMED.to_string(),
        _ => error.to_string(),
    }
}

impl From<&AuthError> for AuthFailure {
    fn from(error: &AuthError) -> Self {
        Self {
            kind: classify(error),
            message: describe(error),
        }
    }
}

impl From<AuthError> for AuthFailure {
    fn from(error: AuthError) -> Self {
        Self::from(&error)
    }
}
