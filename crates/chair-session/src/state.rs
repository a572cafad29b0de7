//! The observable session state and the container that publishes it.

use std::sync::atomic::{AtomicU64, Ordering};

use chair_core::entities::{Chapter, Profile, Role};
use chair_core::enums::ResolutionStatus;
use chair_core::identity::{AuthIdentity, ResolvedIdentity};
use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of who is signed in and what they resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub status: ResolutionStatus,
    /// The provider identity, when one is attached.
    pub identity: Option<AuthIdentity>,
    pub resolved: ResolvedIdentity,
    /// True while a resolution cycle is in flight.
    pub loading: bool,
    /// Cycle that produced this snapshot.
    pub generation: u64,
    /// Why the last cycle ended without an identity, if it failed.
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: ResolutionStatus::Initializing,
            identity: None,
            resolved: ResolvedIdentity::default(),
            loading: true,
            generation: 0,
            last_error: None,
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            status: ResolutionStatus::Unauthenticated,
            loading: false,
            ..Self::default()
        }
    }

    /// Cleared state after a fetch or the whole cycle ran out of time.
    #[must_use]
    pub fn timed_out(reason: impl Into<String>) -> Self {
        Self {
            status: ResolutionStatus::TimedOut,
            last_error: Some(reason.into()),
            ..Self::unauthenticated()
        }
    }

    /// Cleared state after an unexpected error.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            last_error: Some(reason.into()),
            ..Self::unauthenticated()
        }
    }

    /// An identity without a profile: awaiting confirmation, or provisioning
    /// failed (`reason` says why).
    #[must_use]
    pub fn without_profile(identity: AuthIdentity, reason: Option<String>) -> Self {
        Self {
            identity: Some(identity),
            last_error: reason,
            ..Self::unauthenticated()
        }
    }

    /// Full resolution when a membership is present, profile-only otherwise.
    #[must_use]
    pub fn resolved(identity: AuthIdentity, resolved: ResolvedIdentity) -> Self {
        let status = if resolved.is_complete() {
            ResolutionStatus::Resolved
        } else {
            ResolutionStatus::ProfileOnly
        };
        Self {
            status,
            identity: Some(identity),
            resolved,
            loading: false,
            generation: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.resolved.profile.as_ref()
    }

    #[must_use]
    pub const fn chapter(&self) -> Option<&Chapter> {
        self.resolved.chapter.as_ref()
    }

    #[must_use]
    pub const fn role(&self) -> Option<&Role> {
        self.resolved.role.as_ref()
    }

    /// Nothing about a user is visible.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.identity.is_none() && self.resolved.is_empty()
    }
}

/// Process-wide holder of the current [`SessionState`].
///
/// Each resolution cycle takes a generation from [`SessionStore::begin_cycle`]
/// and may only publish its result while that generation is still the latest
/// one issued. Results from superseded cycles are dropped.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<SessionState>,
    latest: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self {
            tx,
            latest: AtomicU64::new(0),
        }
    }

    /// Start a cycle: issue the next generation and publish `Initializing`.
    ///
    /// The previous identity and resolution stay visible until the cycle
    /// commits.
    pub fn begin_cycle(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.status = ResolutionStatus::Initializing;
            state.loading = true;
            state.generation = generation;
        });
        generation
    }

    /// Publish the result of cycle `generation`. Returns `false`, leaving the
    /// state untouched, when a newer cycle has started since.
    pub fn commit(&self, generation: u64, mut next: SessionState) -> bool {
        next.generation = generation;
        next.loading = false;
        self.tx.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != generation {
                return false;
            }
            debug_assert!(
                state.status.can_transition_to(next.status),
                "illegal transition {} -> {}",
                state.status,
                next.status
            );
            *state = next;
            true
        })
    }

    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chair_core::enums::{MembershipTier, UserStatus};
    use chair_core::identity::SignupMetadata;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn identity() -> AuthIdentity {
        AuthIdentity {
            id: "u-1".into(),
            email: "ada@example.edu".into(),
            email_confirmed_at: Some(Utc::now()),
            metadata: SignupMetadata::default(),
        }
    }

    fn profile() -> Profile {
        Profile {
            id: "u-1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.edu".into(),
            tier: MembershipTier::Free,
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn starts_initializing_and_loading() {
        let store = SessionStore::new();
        let state = store.snapshot();
        assert_eq!(state.status, ResolutionStatus::Initializing);
        assert!(state.loading);
        assert!(state.is_cleared());
        assert_eq!(store.latest_generation(), 0);
    }

    #[test]
    fn profile_without_membership_is_profile_only() {
        let state =
            SessionState::resolved(identity(), ResolvedIdentity::profile_only(profile()));
        assert_eq!(state.status, ResolutionStatus::ProfileOnly);
        assert!(state.profile().is_some());
        assert!(state.chapter().is_none());
        assert!(state.role().is_none());
    }

    #[test]
    fn failure_states_are_cleared() {
        for state in [
            SessionState::unauthenticated(),
            SessionState::timed_out("profile fetch timed out"),
            SessionState::failed("boom"),
        ] {
            assert!(state.is_cleared());
            assert!(!state.loading);
            assert!(!state.status.is_authenticated());
        }
        assert_eq!(
            SessionState::timed_out("x").status,
            ResolutionStatus::TimedOut
        );
    }

    #[test]
    fn commit_applies_latest_generation() {
        let store = SessionStore::new();
        let generation = store.begin_cycle();
        assert_eq!(generation, 1);
        assert!(store.snapshot().loading);

        assert!(store.commit(generation, SessionState::unauthenticated()));
        let state = store.snapshot();
        assert_eq!(state.status, ResolutionStatus::Unauthenticated);
        assert_eq!(state.generation, 1);
        assert!(!state.loading);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let store = SessionStore::new();
        let first = store.begin_cycle();
        let second = store.begin_cycle();

        assert!(store.commit(second, SessionState::unauthenticated()));
        let stale = SessionState::resolved(identity(), ResolvedIdentity::profile_only(profile()));
        assert!(!store.commit(first, stale));

        let state = store.snapshot();
        assert_eq!(state.status, ResolutionStatus::Unauthenticated);
        assert_eq!(state.generation, second);
    }

    #[test]
    fn stale_commit_does_not_end_a_newer_cycle() {
        let store = SessionStore::new();
        let first = store.begin_cycle();
        let _second = store.begin_cycle();
        assert!(!store.commit(first, SessionState::unauthenticated()));
        let state = store.snapshot();
        assert!(state.loading);
        assert_eq!(state.status, ResolutionStatus::Initializing);
    }

    #[tokio::test]
    async fn subscribers_observe_commits() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        let generation = store.begin_cycle();
        store.commit(generation, SessionState::unauthenticated());

        let state = rx
            .wait_for(|state| !state.loading)
            .await
            .expect("sender alive")
            .clone();
        assert_eq!(state.status, ResolutionStatus::Unauthenticated);
    }
}
