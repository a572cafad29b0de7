//! Chapter repository — lookup by natural key, create on demand.

use chrono::Utc;

use chair_core::entities::{Chapter, ChapterKey};

use crate::error::DatabaseError;
use crate::helpers::{generate_id, parse_datetime};
use crate::service::ChairService;

const PREFIX_CHAPTER: &str = "chp";

pub(crate) fn row_to_chapter(row: &libsql::Row, offset: i32) -> Result<Chapter, DatabaseError> {
    Ok(Chapter {
        id: row.get::<String>(offset)?,
        school_name: row.get::<String>(offset + 1)?,
        organization_name: row.get::<String>(offset + 2)?,
        chapter_code: row.get::<String>(offset + 3)?,
        created_at: parse_datetime(&row.get::<String>(offset + 4)?)?,
    })
}

pub(crate) async fn find_by_key(
    conn: &libsql::Connection,
    key: &ChapterKey,
) -> Result<Option<Chapter>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT id, school_name, organization_name, chapter_code, created_at FROM chapters
             WHERE school_name = ?1 AND organization_name = ?2 AND chapter_code = ?3",
            libsql::params![
                key.school.as_str(),
                key.organization.as_str(),
                key.chapter_code.as_str()
            ],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_chapter(&row, 0)?)),
        None => Ok(None),
    }
}

pub(crate) async fn insert(
    conn: &libsql::Connection,
    key: &ChapterKey,
) -> Result<Chapter, DatabaseError> {
    let id = generate_id(conn, PREFIX_CHAPTER).await?;
    let now = Utc::now();
    conn.execute(
        "INSERT INTO chapters (id, school_name, organization_name, chapter_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        libsql::params![
            id.as_str(),
            key.school.as_str(),
            key.organization.as_str(),
            key.chapter_code.as_str(),
            now.to_rfc3339()
        ],
    )
    .await?;

    Ok(Chapter {
        id,
        school_name: key.school.clone(),
        organization_name: key.organization.clone(),
        chapter_code: key.chapter_code.clone(),
        created_at: now,
    })
}

/// Return the chapter with this natural key, inserting it first if absent.
pub(crate) async fn find_or_insert(
    conn: &libsql::Connection,
    key: &ChapterKey,
) -> Result<(Chapter, bool), DatabaseError> {
    if let Some(existing) = find_by_key(conn, key).await? {
        return Ok((existing, false));
    }
    Ok((insert(conn, key).await?, true))
}

impl ChairService {
    /// Look up a chapter by `(school, organization, chapter_code)`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no chapter has this key.
    pub async fn get_chapter_by_key(&self, key: &ChapterKey) -> Result<Chapter, DatabaseError> {
        let _gate = self.read_gate().await;
        find_by_key(self.db().conn(), key)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Count all chapters (used by status output and tests).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_chapters(&self) -> Result<i64, DatabaseError> {
        let _gate = self.read_gate().await;
        let mut rows = self
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM chapters", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;

    fn key() -> ChapterKey {
        ChapterKey {
            school: "State University".into(),
            organization: "Alpha Beta".into(),
            chapter_code: "AB-12".into(),
        }
    }

    #[tokio::test]
    async fn find_or_insert_reuses_existing_chapter() {
        let svc = test_service().await;
        let conn = svc.db().conn();

        let (first, created) = find_or_insert(conn, &key()).await.unwrap();
        assert!(created);
        let (second, created) = find_or_insert(conn, &key()).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(svc.count_chapters().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn chapter_key_is_exact_match() {
        let svc = test_service().await;
        find_or_insert(svc.db().conn(), &key()).await.unwrap();

        let other = ChapterKey {
            chapter_code: "AB-13".into(),
            ..key()
        };
        let err = svc.get_chapter_by_key(&other).await.unwrap_err();
        assert!(err.is_not_found());

        let found = svc.get_chapter_by_key(&key()).await.unwrap();
        assert_eq!(found.key(), key());
    }
}
