//! Database error types for chair-db.

use thiserror::Error;

/// Code reported when a single-row query matched nothing.
///
/// Mirrors the hosted query service's "no rows" code so callers can tell an
/// expected absence apart from a real failure.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Provisioning referenced a role name with no matching row.
    #[error("Role not found: {0}")]
    UnknownRole(String),

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

impl DatabaseError {
    /// Machine-readable code, present only for "no matching row".
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::NoResult => Some(NO_ROWS_CODE),
            _ => None,
        }
    }

    /// Whether this is the "no matching row" error (code [`NO_ROWS_CODE`]).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NoResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_result_is_not_found() {
        assert!(DatabaseError::NoResult.is_not_found());
        assert_eq!(DatabaseError::NoResult.code(), Some(NO_ROWS_CODE));
        assert!(!DatabaseError::UnknownRole("Captain".into()).is_not_found());
        assert!(!DatabaseError::Query("boom".into()).is_not_found());
        assert!(DatabaseError::InvalidState("x".into()).code().is_none());
    }

    #[test]
    fn every_failure_other_than_no_result_is_codeless() {
        let failures = [
            DatabaseError::Query("boom".into()),
            DatabaseError::Migration("001_initial: boom".into()),
            DatabaseError::UnknownRole("Captain".into()),
            DatabaseError::InvalidState("bad tier".into()),
        ];
        for error in &failures {
            // Adding a variant forces a decision here.
            let expected = match error {
                DatabaseError::NoResult => Some(NO_ROWS_CODE),
                DatabaseError::Query(_)
                | DatabaseError::Migration(_)
                | DatabaseError::UnknownRole(_)
                | DatabaseError::InvalidState(_)
                | DatabaseError::LibSql(_) => None,
            };
            assert_eq!(error.code(), expected);
            assert!(!error.is_not_found());
        }
    }
}
