#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chair_auth::{
    AuthError, AuthNotification, AuthSession, ConfirmationPolicy, IdentityProvider,
    LocalIdentityProvider, LocalProviderOptions, SignUpResponse, TokenStore,
};
use chair_core::entities::{MembershipDetails, Profile};
use chair_core::identity::SignupMetadata;
use chair_db::error::DatabaseError;
use chair_db::repos::provision::{ProvisionOutcome, ProvisionRequest};
use chair_db::service::ChairService;
use chair_db::store::ProfileStore;
use chair_session::{ResolverTimeouts, SessionBootstrap, SignUpRequest};
use tokio::sync::broadcast;

pub type Bootstrap = SessionBootstrap<Arc<LocalIdentityProvider>, Arc<ScriptedStore>>;

/// Wraps the real service and injects stalls, delays and failures.
pub struct ScriptedStore {
    pub inner: ChairService,
    pub stall_profile: AtomicBool,
    pub stall_membership: AtomicBool,
    pub fail_membership: AtomicBool,
    /// One-shot delay applied to the next profile fetch.
    pub delay_profile_ms: AtomicU64,
}

impl ScriptedStore {
    pub async fn new() -> Self {
        Self {
            inner: ChairService::new_local(":memory:").await.unwrap(),
            stall_profile: AtomicBool::new(false),
            stall_membership: AtomicBool::new(false),
            fail_membership: AtomicBool::new(false),
            delay_profile_ms: AtomicU64::new(0),
        }
    }

    pub async fn count(&self, table: &str) -> i64 {
        let mut rows = self
            .inner
            .db()
            .conn()
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
    }
}

impl ProfileStore for ScriptedStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, DatabaseError> {
        if self.stall_profile.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let delay = self.delay_profile_ms.swap(0, Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.fetch_profile(user_id).await
    }

    async fn fetch_primary_membership(
        &self,
        user_id: &str,
    ) -> Result<MembershipDetails, DatabaseError> {
        if self.stall_membership.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_membership.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("connection reset".into()));
        }
        self.inner.fetch_primary_membership(user_id).await
    }

    async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome, DatabaseError> {
        self.inner.provision(request).await
    }
}

/// Delegates to a local provider but publishes notifications only when the
/// test sends them through `events`.
pub struct RelayProvider {
    pub inner: Arc<LocalIdentityProvider>,
    pub events: broadcast::Sender<AuthNotification>,
}

impl RelayProvider {
    pub fn new(inner: Arc<LocalIdentityProvider>) -> Self {
        let (events, _) = broadcast::channel(chair_auth::provider::NOTIFICATION_CAPACITY);
        Self { inner, events }
    }
}

impl IdentityProvider for RelayProvider {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        self.inner.current_session().await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignUpResponse, AuthError> {
        self.inner.sign_up(email, password, metadata).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.sign_out().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        self.events.subscribe()
    }
}

pub fn fast_timeouts() -> ResolverTimeouts {
    ResolverTimeouts {
        fetch: Duration::from_millis(100),
        cycle: Duration::from_millis(400),
    }
}

pub async fn provider(confirmation: ConfirmationPolicy) -> Arc<LocalIdentityProvider> {
    let provider = LocalIdentityProvider::open(
        ":memory:",
        LocalProviderOptions {
            confirmation,
            tokens: TokenStore::memory(),
            ..LocalProviderOptions::default()
        },
    )
    .await
    .unwrap();
    Arc::new(provider)
}

pub async fn bootstrap(confirmation: ConfirmationPolicy) -> Bootstrap {
    bootstrap_with(confirmation, ResolverTimeouts::default()).await
}

pub async fn bootstrap_with(
    confirmation: ConfirmationPolicy,
    timeouts: ResolverTimeouts,
) -> Bootstrap {
    SessionBootstrap::new(
        provider(confirmation).await,
        Arc::new(ScriptedStore::new().await),
        timeouts,
    )
}

pub fn sign_up_request(email: &str, role_name: &str) -> SignUpRequest {
    SignUpRequest {
        email: email.into(),
        password: "hunter22".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        school: "State University".into(),
        organization: "Alpha Beta".into(),
        chapter_code: "AB-12".into(),
        role_name: role_name.into(),
    }
}
