//! The seam between the session bootstrap and whichever identity provider is
//! configured.

use std::future::Future;
use std::sync::Arc;

use chair_core::identity::SignupMetadata;
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::session::{AuthNotification, AuthSession, SignUpResponse};

/// Capacity of each provider's notification channel.
pub const NOTIFICATION_CAPACITY: usize = 32;

/// Email/password identity provider.
///
/// Every state-changing call also publishes an [`AuthNotification`] to
/// subscribers obtained from [`IdentityProvider::subscribe`].
pub trait IdentityProvider: Send + Sync {
    /// The persisted session, if one exists and is still valid.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<AuthSession>, AuthError>> + Send;

    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, AuthError>> + Send;

    /// Register a new identity. `metadata` is stored alongside it and returned
    /// on every later session.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> impl Future<Output = Result<SignUpResponse, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn subscribe(&self) -> broadcast::Receiver<AuthNotification>;
}

impl<T: IdentityProvider> IdentityProvider for Arc<T> {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        (**self).current_session().await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        (**self).sign_in_with_password(email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignUpResponse, AuthError> {
        (**self).sign_up(email, password, metadata).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        (**self).sign_out().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        (**self).subscribe()
    }
}

/// Publish a notification, ignoring the case where nobody is listening.
pub(crate) fn publish(
    sender: &broadcast::Sender<AuthNotification>,
    notification: AuthNotification,
) {
    let event = notification.event;
    if sender.send(notification).is_err() {
        tracing::trace!(%event, "no auth subscribers");
    }
}
