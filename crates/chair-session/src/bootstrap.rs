//! The session bootstrap: resolves who is signed in, provisions first-time
//! profiles, and keeps the published [`SessionState`] in step with the
//! identity provider.
//!
//! Every resolution runs as a cycle:
//!
//! ```text
//! begin_cycle ─► identity? ─no──────────────────────────► unauthenticated
//!                   │yes
//!                   ▼
//!               fetch profile ─not found─► confirmed? ─no─► identity only
//!                   │                         │yes
//!                   │                         ▼
//!                   │                     provision ─err─► identity only + error
//!                   ▼◄────────────────────────┘
//!               fetch membership ─not found─► profile_only
//!                   │
//!                   ▼
//!                resolved
//! ```
//!
//! Each fetch is bounded by the fetch timeout and the whole cycle by the cycle
//! timeout; running out of either publishes the cleared `timed_out` state.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chair_auth::{AuthNotification, IdentityProvider};
use chair_config::ResolverConfig;
use chair_core::enums::AuthEvent;
use chair_core::identity::{AuthIdentity, ResolvedIdentity, SignupMetadata};
use chair_db::repos::provision::ProvisionRequest;
use chair_db::store::ProfileStore;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::deadline::bounded;
use crate::error::SessionError;
use crate::messages::AuthFailure;
use crate::state::{SessionState, SessionStore};

/// Time limits for a resolution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverTimeouts {
    /// Ceiling for each provider or persistence call.
    pub fetch: Duration,
    /// Ceiling for the whole cycle.
    pub cycle: Duration,
}

impl Default for ResolverTimeouts {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for ResolverTimeouts {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            fetch: config.fetch_timeout(),
            cycle: config.cycle_timeout(),
        }
    }
}

/// Everything collected by the sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub school: String,
    pub organization: String,
    pub chapter_code: String,
    pub role_name: String,
}

impl SignUpRequest {
    /// Metadata stored with the identity for later provisioning.
    #[must_use]
    pub fn metadata(&self) -> SignupMetadata {
        SignupMetadata {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            school: self.school.clone(),
            organization: self.organization.clone(),
            chapter_code: self.chapter_code.clone(),
            role_name: self.role_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignUpOutcome {
    /// The provider is holding the identity until its email is confirmed; no
    /// profile exists yet.
    pub needs_confirmation: bool,
}

/// Where a cycle gets its identity from.
enum Source {
    /// Ask the provider for its persisted session.
    Provider,
    /// Use this identity (or its absence) as given.
    Known(Option<AuthIdentity>),
}

fn source_for(notification: AuthNotification) -> Source {
    tracing::debug!(event = %notification.event, "auth notification");
    let identity = match notification.event {
        AuthEvent::SignedOut => None,
        AuthEvent::InitialSession
        | AuthEvent::SignedIn
        | AuthEvent::TokenRefreshed
        | AuthEvent::UserUpdated => notification.session.map(|session| session.identity),
    };
    Source::Known(identity)
}

struct Inner<P, S> {
    provider: P,
    store: S,
    state: SessionStore,
    timeouts: ResolverTimeouts,
    /// Identity the latest cycle resolved for, kept across failed cycles so a
    /// refresh can retry.
    known: Mutex<Option<AuthIdentity>>,
}

/// Owns the current session state for the process.
///
/// Cheap to clone; clones share the same state.
pub struct SessionBootstrap<P, S> {
    inner: Arc<Inner<P, S>>,
}

impl<P, S> Clone for SessionBootstrap<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, S> SessionBootstrap<P, S>
where
    P: IdentityProvider + 'static,
    S: ProfileStore + 'static,
{
    #[must_use]
    pub fn new(provider: P, store: S, timeouts: ResolverTimeouts) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                store,
                state: SessionStore::new(),
                timeouts,
                known: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    #[must_use]
    pub fn timeouts(&self) -> ResolverTimeouts {
        self.inner.timeouts
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Wait until no cycle is in flight and return that state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the state channel is gone.
    pub async fn settled(&self) -> Result<SessionState, SessionError> {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(|state| !state.loading)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(state.clone())
    }

    /// Resolve from the provider's persisted session (application start).
    pub async fn initialize(&self) -> SessionState {
        self.run_cycle(Source::Provider).await
    }

    /// Start a task that restarts resolution on every provider notification.
    ///
    /// Generations are taken in notification order and each cycle then runs
    /// on its own task, so a stalled cycle never delays a newer one. The task
    /// lives until the returned handle is aborted.
    #[must_use]
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let mut events = self.inner.provider.subscribe();
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                let source = match events.recv().await {
                    Ok(notification) => source_for(notification),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed auth notifications; re-reading session");
                        Source::Provider
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let generation = this.inner.state.begin_cycle();
                let cycle = this.clone();
                tokio::spawn(async move {
                    cycle.finish_cycle(generation, source).await;
                });
            }
        })
    }

    /// Register a new identity.
    ///
    /// When the provider signs the identity in straight away the profile is
    /// provisioned here and a cycle resolves it. Otherwise nothing is written
    /// until the identity is confirmed and observed signed in.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] describing why the provider refused.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthFailure> {
        let metadata = request.metadata();
        let response = self
            .inner
            .provider
            .sign_up(&request.email, &request.password, &metadata)
            .await
            .map_err(|error| {
                tracing::info!(%error, "sign-up rejected");
                AuthFailure::from(error)
            })?;

        if response.needs_confirmation() {
            tracing::info!(user_id = %response.identity.id, "sign-up awaiting email confirmation");
            return Ok(SignUpOutcome {
                needs_confirmation: true,
            });
        }

        let mut identity = response.identity;
        if identity.metadata.is_blank() {
            identity.metadata = metadata;
        }
        let request = ProvisionRequest::from_identity(&identity);
        if let Err(error) = bounded(
            "provision",
            self.inner.timeouts.fetch,
            self.inner.store.provision(&request),
        )
        .await
        {
            tracing::warn!(user_id = %identity.id, %error, "provisioning after sign-up failed");
        }

        self.run_cycle(Source::Known(Some(identity))).await;
        Ok(SignUpOutcome {
            needs_confirmation: false,
        })
    }

    /// Sign in with email and password and resolve the new identity.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] for bad credentials, an unconfirmed email
    /// or a misconfigured provider.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionState, AuthFailure> {
        let session = self
            .inner
            .provider
            .sign_in_with_password(email, password)
            .await
            .map_err(|error| {
                tracing::info!(%error, "sign-in rejected");
                AuthFailure::from(error)
            })?;
        Ok(self.run_cycle(Source::Known(Some(session.identity))).await)
    }

    /// End the session. Provider errors are logged; the state always ends
    /// up unauthenticated.
    pub async fn sign_out(&self) -> SessionState {
        if let Err(error) = self.inner.provider.sign_out().await {
            tracing::warn!(%error, "provider sign-out failed");
        }
        self.run_cycle(Source::Known(None)).await
    }

    /// Re-fetch profile and membership for the identity already known.
    /// Does nothing when no identity is known.
    pub async fn refresh_user_data(&self) -> SessionState {
        let known = self
            .inner
            .known
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match known {
            Some(identity) => self.run_cycle(Source::Known(Some(identity))).await,
            None => {
                tracing::debug!("refresh requested with no known identity");
                self.state()
            }
        }
    }

    fn remember(&self, generation: u64, identity: Option<&AuthIdentity>) {
        if self.inner.state.latest_generation() == generation {
            *self
                .inner
                .known
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = identity.cloned();
        }
    }

    async fn run_cycle(&self, source: Source) -> SessionState {
        let generation = self.inner.state.begin_cycle();
        self.finish_cycle(generation, source).await
    }

    async fn finish_cycle(&self, generation: u64, source: Source) -> SessionState {
        tracing::debug!(generation, "resolution cycle started");

        let limit = self.inner.timeouts.cycle;
        let next = match tokio::time::timeout(limit, self.resolve(generation, source)).await {
            Ok(Ok(state)) => state,
            Ok(Err(error)) if error.is_timeout() => {
                tracing::warn!(generation, %error, "resolution timed out");
                SessionState::timed_out(error.to_string())
            }
            Ok(Err(error)) => {
                tracing::warn!(generation, %error, "resolution failed");
                SessionState::failed(error.to_string())
            }
            Err(_) => {
                tracing::warn!(generation, ?limit, "resolution cycle timed out");
                SessionState::timed_out(format!(
                    "resolution timed out after {}ms",
                    limit.as_millis()
                ))
            }
        };

        let status = next.status;
        if self.inner.state.commit(generation, next) {
            tracing::debug!(generation, %status, "resolution committed");
        } else {
            tracing::debug!(generation, %status, "discarding result of superseded cycle");
        }
        self.state()
    }

    async fn resolve(&self, generation: u64, source: Source) -> Result<SessionState, SessionError> {
        let identity = match source {
            Source::Provider => bounded(
                "session",
                self.inner.timeouts.fetch,
                self.inner.provider.current_session(),
            )
            .await?
            .map(|session| session.identity),
            Source::Known(identity) => identity,
        };
        self.remember(generation, identity.as_ref());

        match identity {
            Some(identity) => self.resolve_identity(identity).await,
            None => Ok(SessionState::unauthenticated()),
        }
    }

    async fn resolve_identity(&self, identity: AuthIdentity) -> Result<SessionState, SessionError> {
        let fetch = self.inner.timeouts.fetch;
        let store = &self.inner.store;

        let profile = match bounded("profile", fetch, store.fetch_profile(&identity.id)).await {
            Ok(profile) => profile,
            Err(error) if error.is_not_found() => {
                if !identity.is_confirmed() {
                    tracing::debug!(user_id = %identity.id, "identity awaiting confirmation");
                    return Ok(SessionState::without_profile(identity, None));
                }
                let request = ProvisionRequest::from_identity(&identity);
                match bounded("provision", fetch, store.provision(&request)).await {
                    Ok(outcome) => outcome.profile().clone(),
                    Err(error) if error.is_timeout() => return Err(error),
                    Err(error) => {
                        tracing::warn!(user_id = %identity.id, %error, "provisioning failed");
                        return Ok(SessionState::without_profile(
                            identity,
                            Some(error.to_string()),
                        ));
                    }
                }
            }
            Err(error) => return Err(error),
        };

        let resolved = match bounded(
            "membership",
            fetch,
            store.fetch_primary_membership(&identity.id),
        )
        .await
        {
            Ok(details) => {
                ResolvedIdentity::full(profile, details.chapter, details.role, details.link)
            }
            Err(error) if error.is_not_found() => ResolvedIdentity::profile_only(profile),
            Err(error) => return Err(error),
        };
        Ok(SessionState::resolved(identity, resolved))
    }
}
