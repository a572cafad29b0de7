use std::future::Future;
use std::time::Duration;

use crate::error::SessionError;

/// Await `fut`, giving up after `limit`.
///
/// # Errors
///
/// Returns `SessionError::TimedOut` naming `stage` if the limit elapses, or
/// the future's own error converted into a `SessionError`.
pub async fn bounded<T, E>(
    stage: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, SessionError>
where
    SessionError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(SessionError::from),
        Err(_) => Err(SessionError::TimedOut {
            stage,
            limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
