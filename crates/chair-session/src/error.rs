use chair_auth::AuthError;
use chair_db::error::DatabaseError;
use thiserror::Error;

/// Why a resolution cycle could not finish.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{stage} fetch timed out after {limit_ms}ms")]
    TimedOut { stage: &'static str, limit_ms: u64 },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("session state channel closed")]
    Closed,
}

impl SessionError {
    /// The persistence service reported "no matching row".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Database(error) if error.is_not_found())
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_only_the_no_rows_case() {
        assert!(SessionError::from(DatabaseError::NoResult).is_not_found());
        assert!(!SessionError::from(DatabaseError::Query("boom".into())).is_not_found());
        assert!(
            !SessionError::TimedOut {
                stage: "profile",
                limit_ms: 5
            }
            .is_not_found()
        );
    }

    #[test]
    fn timeout_message_names_the_stage() {
        let err = SessionError::TimedOut {
            stage: "membership",
            limit_ms: 5_000,
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "membership fetch timed out after 5000ms");
    }
}
