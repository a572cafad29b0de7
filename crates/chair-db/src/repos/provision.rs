//! First-time profile provisioning.
//!
//! Creates the profile, resolves (or creates) the chapter, resolves the role
//! and links them with a primary membership — all inside one transaction.
//! Any failure rolls back every earlier step, so a reader never sees a profile
//! without the membership it was provisioned with.

use chair_core::entities::{ChapterKey, MembershipDetails, Profile};
use chair_core::identity::AuthIdentity;

use crate::error::DatabaseError;
use crate::repos::membership::NewMembership;
use crate::repos::profile::NewProfile;
use crate::repos::{chapter, membership, profile, role};
use crate::service::ChairService;

/// Everything needed to provision a profile for a confirmed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Identity subject id; becomes the profile id.
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub chapter: ChapterKey,
    pub role_name: String,
}

impl ProvisionRequest {
    /// Build a request from the identity and the metadata stored with it at
    /// sign-up. Missing metadata fields become empty strings.
    #[must_use]
    pub fn from_identity(identity: &AuthIdentity) -> Self {
        let meta = &identity.metadata;
        Self {
            user_id: identity.id.clone(),
            email: identity.email.clone(),
            first_name: meta.first_name.clone(),
            last_name: meta.last_name.clone(),
            chapter: ChapterKey {
                school: meta.school.clone(),
                organization: meta.organization.clone(),
                chapter_code: meta.chapter_code.clone(),
            },
            role_name: meta.role_name.clone(),
        }
    }
}

/// Result of a provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// All rows were written by this call.
    Created {
        profile: Profile,
        membership: MembershipDetails,
        chapter_created: bool,
    },
    /// A profile with this id already existed; nothing was written.
    AlreadyProvisioned(Profile),
}

impl ProvisionOutcome {
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        match self {
            Self::Created { profile, .. } | Self::AlreadyProvisioned(profile) => profile,
        }
    }

    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

async fn provision_in(
    conn: &libsql::Connection,
    request: &ProvisionRequest,
) -> Result<ProvisionOutcome, DatabaseError> {
    if let Some(existing) = profile::find(conn, &request.user_id).await? {
        return Ok(ProvisionOutcome::AlreadyProvisioned(existing));
    }

    let profile = profile::insert(
        conn,
        &NewProfile {
            id: &request.user_id,
            first_name: &request.first_name,
            last_name: &request.last_name,
            email: &request.email,
        },
    )
    .await?;

    let (chapter, chapter_created) = chapter::find_or_insert(conn, &request.chapter).await?;

    let role = role::find_by_name(conn, &request.role_name)
        .await?
        .ok_or_else(|| DatabaseError::UnknownRole(request.role_name.clone()))?;

    let link = membership::insert(
        conn,
        &NewMembership {
            user_id: &profile.id,
            chapter_id: &chapter.id,
            role_id: &role.id,
            is_primary: true,
        },
    )
    .await?;

    Ok(ProvisionOutcome::Created {
        profile,
        membership: MembershipDetails {
            link,
            chapter,
            role,
        },
        chapter_created,
    })
}

impl ChairService {
    /// Provision a profile, chapter and primary membership in one transaction.
    ///
    /// Idempotent: when a profile with `request.user_id` already exists the
    /// call returns [`ProvisionOutcome::AlreadyProvisioned`] without writing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownRole` if `request.role_name` matches no
    /// role, or any `DatabaseError` from the inserts. Nothing is written in
    /// either case.
    pub async fn provision_profile(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionOutcome, DatabaseError> {
        let _gate = self.write_gate().await;
        let tx = self.db().conn().transaction().await?;

        match provision_in(&tx, request).await {
            Ok(outcome) => {
                tx.commit().await?;
                if let ProvisionOutcome::Created {
                    chapter_created, ..
                } = &outcome
                {
                    tracing::info!(
                        user_id = %request.user_id,
                        role = %request.role_name,
                        chapter_created,
                        "provisioned profile"
                    );
                }
                Ok(outcome)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(%rollback_error, "provisioning rollback failed");
                }
                tracing::warn!(user_id = %request.user_id, %error, "provisioning aborted");
                Err(error)
            }
        }
    }
}
