//! Profile (`users` table) repository.

use chrono::Utc;

use chair_core::entities::Profile;
use chair_core::enums::{MembershipTier, UserStatus};

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::ChairService;

const PROFILE_COLUMNS: &str =
    "id, first_name, last_name, email, membership_tier, status, created_at";

fn row_to_profile(row: &libsql::Row) -> Result<Profile, DatabaseError> {
    Ok(Profile {
        id: row.get::<String>(0)?,
        first_name: row.get::<String>(1)?,
        last_name: row.get::<String>(2)?,
        email: row.get::<String>(3)?,
        tier: parse_enum(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Fields needed to create a profile row.
#[derive(Debug, Clone)]
pub struct NewProfile<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

pub(crate) async fn find(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<Profile>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1"),
            [id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_profile(&row)?)),
        None => Ok(None),
    }
}

pub(crate) async fn insert(
    conn: &libsql::Connection,
    new: &NewProfile<'_>,
) -> Result<Profile, DatabaseError> {
    let now = Utc::now();
    let tier = MembershipTier::lowest();
    let status = UserStatus::Active;
    conn.execute(
        "INSERT INTO users (id, first_name, last_name, email, membership_tier, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        libsql::params![
            new.id,
            new.first_name,
            new.last_name,
            new.email,
            tier.as_str(),
            status.as_str(),
            now.to_rfc3339()
        ],
    )
    .await?;

    Ok(Profile {
        id: new.id.to_string(),
        first_name: new.first_name.to_string(),
        last_name: new.last_name.to_string(),
        email: new.email.to_string(),
        tier,
        status,
        created_at: now,
    })
}

impl ChairService {
    /// Get a profile by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no profile has this id.
    pub async fn get_profile(&self, id: &str) -> Result<Profile, DatabaseError> {
        let _gate = self.read_gate().await;
        find(self.db().conn(), id)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Create a bare profile without any membership.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails (e.g. the id already exists).
    pub async fn create_profile(&self, new: &NewProfile<'_>) -> Result<Profile, DatabaseError> {
        let _gate = self.write_gate().await;
        insert(self.db().conn(), new).await
    }
}
