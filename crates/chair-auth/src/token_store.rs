use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::AuthError;
use crate::session::StoredSession;

pub const DEFAULT_KEYRING_SERVICE: &str = "chair-cli";
const KEYRING_USER: &str = "session";
const SESSION_FILE_NAME: &str = "session";
const TOKEN_ENV_VAR: &str = "CHAIR_AUTH__TOKEN";

/// Where a provider keeps its session between process runs.
///
/// The OS-backed store tries the keychain first, then `CHAIR_AUTH__TOKEN`,
/// then `~/.chair/session`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    backend: Backend,
}

#[derive(Debug, Clone)]
enum Backend {
    Os { service: String },
    File(PathBuf),
    Memory(Arc<Mutex<Option<String>>>),
}

impl TokenStore {
    /// Keyring → env → `~/.chair/session`, under the given keyring service.
    #[must_use]
    pub fn os(service: impl Into<String>) -> Self {
        Self {
            backend: Backend::Os {
                service: service.into(),
            },
        }
    }

    /// A single JSON file at `path`, for headless machines.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
        }
    }

    /// Process-local storage that is lost on exit.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(None))),
        }
    }

    /// Persist a session. The OS store falls back to the file if the keychain
    /// is unavailable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the session cannot be written.
    pub fn store(&self, session: &StoredSession) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| AuthError::TokenStoreError(format!("serialize session: {e}")))?;
        match &self.backend {
            Backend::Os { service } => match keyring::Entry::new(service, KEYRING_USER) {
                Ok(entry) => match entry.set_password(&raw) {
                    Ok(()) => Ok(()),
                    Err(error) => {
                        tracing::warn!(%error, "keyring store failed; falling back to file");
                        store_file(&default_session_path()?, &raw)
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "keyring unavailable; falling back to file");
                    store_file(&default_session_path()?, &raw)
                }
            },
            Backend::File(path) => store_file(path, &raw),
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
                Ok(())
            }
        }
    }

    /// Load the stored session, if any. Unreadable entries are skipped.
    #[must_use]
    pub fn load(&self) -> Option<StoredSession> {
        match &self.backend {
            Backend::Os { service } => {
                // 1. Keyring
                if let Some(session) = load_keyring(service).as_deref().and_then(parse_stored) {
                    return Some(session);
                }

                // 2. Environment variable: either a stored-session JSON or a bare token
                if let Ok(token) = std::env::var(TOKEN_ENV_VAR)
                    && !token.trim().is_empty()
                {
                    return Some(
                        parse_stored(&token).unwrap_or_else(|| StoredSession::bare(token.trim())),
                    );
                }

                // 3. File fallback
                default_session_path()
                    .ok()
                    .and_then(|path| load_file(&path))
                    .as_deref()
                    .and_then(parse_stored)
            }
            Backend::File(path) => load_file(path).as_deref().and_then(parse_stored),
            Backend::Memory(slot) => slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_deref()
                .and_then(parse_stored),
        }
    }

    /// Remove the stored session everywhere this store writes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the session file cannot be removed.
    pub fn delete(&self) -> Result<(), AuthError> {
        match &self.backend {
            Backend::Os { service } => {
                // May not exist
                if let Ok(entry) = keyring::Entry::new(service, KEYRING_USER) {
                    let _ = entry.delete_credential();
                }
                delete_file(&default_session_path()?)
            }
            Backend::File(path) => delete_file(path),
            Backend::Memory(slot) => {
                slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                Ok(())
            }
        }
    }

    /// Which tier the current session came from (for status display).
    #[must_use]
    pub fn detect_source(&self) -> Option<&'static str> {
        match &self.backend {
            Backend::Os { service } => {
                if load_keyring(service).is_some() {
                    return Some("keyring");
                }
                if std::env::var(TOKEN_ENV_VAR).is_ok_and(|t| !t.trim().is_empty()) {
                    return Some("env");
                }
                default_session_path()
                    .ok()
                    .and_then(|path| load_file(&path))
                    .map(|_| "file")
            }
            Backend::File(path) => load_file(path).map(|_| "file"),
            Backend::Memory(_) => self.load().map(|_| "memory"),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::os(DEFAULT_KEYRING_SERVICE)
    }
}

fn parse_stored(raw: &str) -> Option<StoredSession> {
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(error) => {
            tracing::debug!(%error, "ignoring unreadable stored session");
            None
        }
    }
}

fn load_keyring(service: &str) -> Option<String> {
    keyring::Entry::new(service, KEYRING_USER)
        .ok()?
        .get_password()
        .ok()
        .filter(|raw| !raw.is_empty())
}

// --- Private file helpers ---

fn default_session_path() -> Result<PathBuf, AuthError> {
    dirs::home_dir()
        .map(|h| h.join(".chair").join(SESSION_FILE_NAME))
        .ok_or_else(|| {
            AuthError::TokenStoreError("home directory not found — cannot store session".into())
        })
}

fn store_file(path: &Path, raw: &str) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AuthError::TokenStoreError(format!("mkdir {}: {e}", parent.display())))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
            }
        }
    }
    fs::write(path, raw)
        .map_err(|e| AuthError::TokenStoreError(format!("write {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| AuthError::TokenStoreError(format!("chmod {}: {e}", path.display())))?;
    }

    Ok(())
}

fn load_file(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .filter(|s| !s.trim().is_empty())
}

fn delete_file(path: &Path) -> Result<(), AuthError> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| {
            AuthError::TokenStoreError(format!("failed to delete {}: {e}", path.display()))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> StoredSession {
        StoredSession {
            access_token: "acc_123".into(),
            refresh_token: Some("ref_456".into()),
            expires_at: Some(chrono::Utc::now()),
        }
    }

    #[test]
    fn default_session_path_is_under_home() {
        let path = default_session_path().expect("should resolve");
        assert!(path.ends_with(".chair/session"));
    }

    #[test]
    fn memory_store_load_delete_cycle() {
        let store = TokenStore::memory();
        assert!(store.load().is_none());
        assert!(store.detect_source().is_none());

        let session = sample();
        store.store(&session).unwrap();
        assert_eq!(store.load(), Some(session));
        assert_eq!(store.detect_source(), Some("memory"));

        store.delete().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = TokenStore::memory();
        let clone = store.clone();
        store.store(&StoredSession::bare("tok")).unwrap();
        assert_eq!(clone.load().map(|s| s.access_token).as_deref(), Some("tok"));
    }

    #[test]
    fn file_store_load_delete_cycle() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("nested").join("session");
        let store = TokenStore::file(&path);

        let session = sample();
        store.store(&session).unwrap();
        assert_eq!(store.load(), Some(session));
        assert_eq!(store.detect_source(), Some("file"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path)
                .expect("metadata")
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o600, "session file should be 0600");
        }

        store.delete().unwrap();
        assert!(!path.exists());
        assert!(store.load().is_none());
        // Deleting twice is fine
        store.delete().unwrap();
    }

    #[test]
    fn file_store_ignores_garbage_and_whitespace() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("session");
        let store = TokenStore::file(&path);

        std::fs::write(&path, "   \n  ").expect("write");
        assert!(store.load().is_none());

        std::fs::write(&path, "not json").expect("write");
        assert!(store.load().is_none());
    }

    #[test]
    fn stored_session_tolerates_missing_optional_fields() {
        let parsed = parse_stored(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(parsed, StoredSession::bare("abc"));
    }
}
