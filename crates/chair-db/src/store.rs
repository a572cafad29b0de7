//! The persistence seam the identity resolver depends on.
//!
//! `ChairService` is the production implementation. Other implementations
//! (test doubles, remote query services) only need these three calls.

use std::future::Future;
use std::sync::Arc;

use chair_core::entities::{MembershipDetails, Profile};

use crate::error::DatabaseError;
use crate::repos::provision::{ProvisionOutcome, ProvisionRequest};
use crate::service::ChairService;

/// Reads and writes the resolver performs against the persistence service.
///
/// Single-row reads must report "no matching row" as
/// [`DatabaseError::NoResult`] and nothing else.
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile keyed by the identity subject id.
    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Profile, DatabaseError>> + Send;

    /// Fetch the active primary membership with its chapter and role.
    fn fetch_primary_membership(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<MembershipDetails, DatabaseError>> + Send;

    /// Provision profile, chapter and primary membership atomically.
    fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> impl Future<Output = Result<ProvisionOutcome, DatabaseError>> + Send;
}

impl ProfileStore for ChairService {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, DatabaseError> {
        self.get_profile(user_id).await
    }

    async fn fetch_primary_membership(
        &self,
        user_id: &str,
    ) -> Result<MembershipDetails, DatabaseError> {
        self.get_primary_membership(user_id).await
    }

    async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionOutcome, DatabaseError> {
        self.provision_profile(request).await
    }
}

impl<T: ProfileStore> ProfileStore for Arc<T> {
    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Profile, DatabaseError>> + Send {
        (**self).fetch_profile(user_id)
    }

    fn fetch_primary_membership(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<MembershipDetails, DatabaseError>> + Send {
        (**self).fetch_primary_membership(user_id)
    }

    fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> impl Future<Output = Result<ProvisionOutcome, DatabaseError>> + Send {
        (**self).provision(request)
    }
}
