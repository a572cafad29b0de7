use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("User already registered")]
    DuplicateEmail,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Unable to validate email address: invalid format")]
    InvalidEmail,

    #[error("not authenticated — run `chair auth sign-in`")]
    NotAuthenticated,

    #[error("session expired — run `chair auth sign-in` again")]
    SessionExpired,

    /// Any other rejection reported by the provider, message verbatim.
    #[error("{0}")]
    Provider(String),

    #[error("auth request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth storage error: {0}")]
    Storage(#[from] libsql::Error),

    #[error("keyring error: {0}")]
    KeyringError(String),

    #[error("token store error: {0}")]
    TokenStoreError(String),

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Whether the provider rejected the request itself, as opposed to the
    /// request never reaching it or local storage failing.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::EmailNotConfirmed
                | Self::DuplicateEmail
                | Self::WeakPassword(_)
                | Self::InvalidEmail
                | Self::Provider(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_distinguished_from_infrastructure_errors() {
        assert!(AuthError::InvalidCredentials.is_rejection());
        assert!(AuthError::Provider("Invalid API key".into()).is_rejection());
        assert!(!AuthError::TokenStoreError("disk full".into()).is_rejection());
        assert!(!AuthError::NotAuthenticated.is_rejection());
    }

    #[test]
    fn messages_match_provider_wording() {
        assert_eq!(AuthError::EmailNotConfirmed.to_string(), "Email not confirmed");
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid login credentials"
        );
    }
}
