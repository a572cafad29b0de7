//! # chair-auth
//!
//! Email/password identity providers for chair.
//!
//! [`IdentityProvider`] is the seam the session bootstrap talks to. Two
//! implementations ship: [`LocalIdentityProvider`] (libSQL tables, for
//! development and self-hosting) and [`GoTrueProvider`] (the hosted
//! backend's REST auth API). Both persist the active session through a
//! [`TokenStore`] (OS keychain → `CHAIR_AUTH__TOKEN` → `~/.chair/session`) and
//! push [`AuthNotification`]s to subscribers on every auth-state change.

pub mod credentials;
pub mod error;
pub mod gotrue;
pub mod jwt;
pub mod local;
pub mod provider;
pub mod session;
pub mod token_store;

use chair_core::identity::SignupMetadata;
use tokio::sync::broadcast;

pub use error::AuthError;
pub use gotrue::GoTrueProvider;
pub use local::{ConfirmationPolicy, LocalIdentityProvider, LocalProviderOptions};
pub use provider::IdentityProvider;
pub use session::{AuthNotification, AuthSession, SignUpResponse, StoredSession};
pub use token_store::TokenStore;

/// Whichever provider the configuration selected.
pub enum Provider {
    Local(LocalIdentityProvider),
    GoTrue(GoTrueProvider),
}

impl Provider {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::GoTrue(_) => "gotrue",
        }
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        match self {
            Self::Local(p) => p.tokens(),
            Self::GoTrue(p) => p.tokens(),
        }
    }

    /// Refresh the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if no session is stored.
    pub async fn refresh_session(&self) -> Result<AuthSession, AuthError> {
        match self {
            Self::Local(p) => p.refresh_session().await,
            Self::GoTrue(p) => p.refresh_session().await,
        }
    }
}

impl IdentityProvider for Provider {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        match self {
            Self::Local(p) => p.current_session().await,
            Self::GoTrue(p) => p.current_session().await,
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        match self {
            Self::Local(p) => p.sign_in_with_password(email, password).await,
            Self::GoTrue(p) => p.sign_in_with_password(email, password).await,
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignUpResponse, AuthError> {
        match self {
            Self::Local(p) => p.sign_up(email, password, metadata).await,
            Self::GoTrue(p) => p.sign_up(email, password, metadata).await,
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        match self {
            Self::Local(p) => p.sign_out().await,
            Self::GoTrue(p) => p.sign_out().await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        match self {
            Self::Local(p) => p.subscribe(),
            Self::GoTrue(p) => p.subscribe(),
        }
    }
}
