//! # chair-db
//!
//! libSQL persistence for the records the session bootstrap reads and writes:
//! profiles (`users`), chapters, roles and `user_chapter_links`.
//!
//! Single-row reads report "no matching row" as [`error::DatabaseError::NoResult`]
//! (code [`error::NO_ROWS_CODE`]), which callers treat as an expected absence.
//! Provisioning a new profile is a single transaction: either every row lands
//! or none does.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and connection.
pub struct ChairDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl ChairDb {
    /// Open a local database at the given path (or `":memory:"`).
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let chair_db = Self { db, conn };
        chair_db.run_migrations().await?;
        Ok(chair_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID. Returns e.g., `"chp-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        helpers::generate_id(&self.conn, prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> ChairDb {
        ChairDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        for table in ["users", "chapters", "roles", "user_chapter_links"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn roles_are_seeded() {
        let db = test_db().await;
        let mut rows = db
            .conn()
            .query("SELECT name FROM roles ORDER BY name", ())
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(0).unwrap());
        }
        assert_eq!(names, ["Member", "President", "Social Chair", "Treasurer"]);
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();

        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM roles", ())
            .await
            .unwrap();
        let count = rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap();
        assert_eq!(count, 4, "re-running migrations must not duplicate roles");
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("chp").await.unwrap();
        assert!(id.starts_with("chp-"), "ID should start with 'chp-': {id}");
        assert_eq!(id.len(), 12, "3 prefix + 1 dash + 8 hex: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("mbr").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn second_active_primary_link_is_rejected() {
        let db = test_db().await;
        let conn = db.conn();
        conn.execute(
            "INSERT INTO users (id, email) VALUES ('u-1', 'a@example.edu')",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO chapters (id, school_name, organization_name, chapter_code) VALUES ('chp-1', 'S', 'O', 'C')",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO user_chapter_links (id, user_id, chapter_id, role_id, is_primary) VALUES ('mbr-1', 'u-1', 'chp-1', 'rol-member', 1)",
            (),
        )
        .await
        .unwrap();

        let result = conn
            .execute(
                "INSERT INTO user_chapter_links (id, user_id, chapter_id, role_id, is_primary) VALUES ('mbr-2', 'u-1', 'chp-1', 'rol-president', 1)",
                (),
            )
            .await;
        assert!(result.is_err(), "second active primary link should be rejected");

        // A non-primary link is still allowed.
        conn.execute(
            "INSERT INTO user_chapter_links (id, user_id, chapter_id, role_id, is_primary) VALUES ('mbr-3', 'u-1', 'chp-1', 'rol-treasurer', 0)",
            (),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn link_to_missing_role_is_rejected() {
        let db = test_db().await;
        let conn = db.conn();
        conn.execute(
            "INSERT INTO users (id, email) VALUES ('u-1', 'a@example.edu')",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO chapters (id, school_name, organization_name, chapter_code) VALUES ('chp-1', 'S', 'O', 'C')",
            (),
        )
        .await
        .unwrap();

        let result = conn
            .execute(
                "INSERT INTO user_chapter_links (id, user_id, chapter_id, role_id, is_primary) VALUES ('mbr-1', 'u-1', 'chp-1', 'rol-ghost', 1)",
                (),
            )
            .await;
        assert!(result.is_err(), "foreign key to roles should be enforced");
    }
}
