//! Membership link (`user_chapter_links`) repository.
//!
//! The resolver only ever reads the active-and-primary link, joined with its
//! chapter and role. Secondary or inactive links are stored but not surfaced.

use chrono::Utc;

use chair_core::entities::{MembershipDetails, MembershipLink};

use crate::error::DatabaseError;
use crate::helpers::{generate_id, get_flag, parse_datetime};
use crate::repos::{chapter::row_to_chapter, role::row_to_role};
use crate::service::ChairService;

const PREFIX_MEMBERSHIP: &str = "mbr";

fn row_to_link(row: &libsql::Row) -> Result<MembershipLink, DatabaseError> {
    Ok(MembershipLink {
        id: row.get::<String>(0)?,
        user_id: row.get::<String>(1)?,
        chapter_id: row.get::<String>(2)?,
        role_id: row.get::<String>(3)?,
        is_primary: get_flag(row, 4)?,
        is_active: get_flag(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Fields needed to create a link row.
#[derive(Debug, Clone)]
pub struct NewMembership<'a> {
    pub user_id: &'a str,
    pub chapter_id: &'a str,
    pub role_id: &'a str,
    pub is_primary: bool,
}

pub(crate) async fn find_primary(
    conn: &libsql::Connection,
    user_id: &str,
) -> Result<Option<MembershipDetails>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT l.id, l.user_id, l.chapter_id, l.role_id, l.is_primary, l.is_active, l.created_at,
                    c.id, c.school_name, c.organization_name, c.chapter_code, c.created_at,
                    r.id, r.name, r.description
             FROM user_chapter_links l
             JOIN chapters c ON c.id = l.chapter_id
             JOIN roles r ON r.id = l.role_id
             WHERE l.user_id = ?1 AND l.is_primary = 1 AND l.is_active = 1",
            [user_id],
        )
        .await?;

    let Some(row) = rows.next().await? else {
        return Ok(None);
    };
    let details = MembershipDetails {
        link: row_to_link(&row)?,
        chapter: row_to_chapter(&row, 7)?,
        role: row_to_role(&row, 12)?,
    };

    if rows.next().await?.is_some() {
        return Err(DatabaseError::InvalidState(format!(
            "user {user_id} has more than one active primary membership"
        )));
    }
    Ok(Some(details))
}

pub(crate) async fn insert(
    conn: &libsql::Connection,
    new: &NewMembership<'_>,
) -> Result<MembershipLink, DatabaseError> {
    let id = generate_id(conn, PREFIX_MEMBERSHIP).await?;
    let now = Utc::now();
    conn.execute(
        "INSERT INTO user_chapter_links (id, user_id, chapter_id, role_id, is_primary, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        libsql::params![
            id.as_str(),
            new.user_id,
            new.chapter_id,
            new.role_id,
            i64::from(new.is_primary),
            now.to_rfc3339()
        ],
    )
    .await?;

    Ok(MembershipLink {
        id,
        user_id: new.user_id.to_string(),
        chapter_id: new.chapter_id.to_string(),
        role_id: new.role_id.to_string(),
        is_primary: new.is_primary,
        is_active: true,
        created_at: now,
    })
}

impl ChairService {
    /// Fetch the user's active primary membership with its chapter and role.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` when the user has no active primary
    /// link, or `DatabaseError::InvalidState` if more than one exists.
    pub async fn get_primary_membership(
        &self,
        user_id: &str,
    ) -> Result<MembershipDetails, DatabaseError> {
        let _gate = self.read_gate().await;
        find_primary(self.db().conn(), user_id)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Add a membership link for an existing profile, chapter and role.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert violates a constraint (missing
    /// profile/chapter/role, or a second active primary link).
    pub async fn add_membership(
        &self,
        new: &NewMembership<'_>,
    ) -> Result<MembershipLink, DatabaseError> {
        let _gate = self.write_gate().await;
        insert(self.db().conn(), new).await
    }

    /// Mark a link inactive. Deactivating the primary link drops the user
    /// back to a profile-only resolution.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no link has this id.
    pub async fn deactivate_membership(&self, link_id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_gate().await;
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE user_chapter_links SET is_active = 0 WHERE id = ?1",
                [link_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }
}
