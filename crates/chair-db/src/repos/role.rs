//! Role repository. Roles are a closed set seeded by migration; this module
//! only reads them.

use chair_core::entities::Role;

use crate::error::DatabaseError;
use crate::helpers::get_opt_string;
use crate::service::ChairService;

pub(crate) fn row_to_role(row: &libsql::Row, offset: i32) -> Result<Role, DatabaseError> {
    Ok(Role {
        id: row.get::<String>(offset)?,
        name: row.get::<String>(offset + 1)?,
        description: get_opt_string(row, offset + 2)?,
    })
}

pub(crate) async fn find_by_name(
    conn: &libsql::Connection,
    name: &str,
) -> Result<Option<Role>, DatabaseError> {
    let mut rows = conn
        .query("SELECT id, name, description FROM roles WHERE name = ?1", [name])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_role(&row, 0)?)),
        None => Ok(None),
    }
}

impl ChairService {
    /// Look up a role by its exact name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no role has this name.
    pub async fn get_role_by_name(&self, name: &str) -> Result<Role, DatabaseError> {
        let _gate = self.read_gate().await;
        find_by_name(self.db().conn(), name)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// List every role, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError> {
        let _gate = self.read_gate().await;
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, name, description FROM roles ORDER BY name", ())
            .await?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next().await? {
            roles.push(row_to_role(&row, 0)?);
        }
        Ok(roles)
    }
}
