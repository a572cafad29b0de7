//! libSQL-backed identity provider.
//!
//! Keeps identities and issued sessions in its own tables, which may live in
//! the application database file or a separate one. The session handed out
//! by the last sign-in is persisted through a [`TokenStore`] so a later
//! process picks it up from [`IdentityProvider::current_session`].

use std::time::Duration;

use chair_core::enums::AuthEvent;
use chair_core::identity::{AuthIdentity, SignupMetadata};
use chrono::{DateTime, Utc};
use libsql::Builder;
use tokio::sync::broadcast;

use crate::credentials::{
    check_email, check_strength, generate_subject_id, generate_token, hash_password,
    normalize_email, verify_password,
};
use crate::error::AuthError;
use crate::provider::{IdentityProvider, NOTIFICATION_CAPACITY, publish};
use crate::session::{AuthNotification, AuthSession, EXPIRY_BUFFER_SECS, SignUpResponse};
use crate::token_store::TokenStore;

const MIGRATION_001: &str = include_str!("../migrations/001_auth.sql");

const SESSION_COLUMNS: &str = "s.access_token, s.refresh_token, s.expires_at, \
     i.id, i.email, i.email_confirmed_at, i.metadata";

/// Whether new identities may sign in straight away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmationPolicy {
    /// Identities are confirmed at sign-up and receive a session immediately.
    #[default]
    Immediate,
    /// Identities wait for [`LocalIdentityProvider::confirm_email`].
    EmailLink,
}

#[derive(Debug, Clone)]
pub struct LocalProviderOptions {
    pub confirmation: ConfirmationPolicy,
    pub session_ttl: Duration,
    pub tokens: TokenStore,
}

impl Default for LocalProviderOptions {
    fn default() -> Self {
        Self {
            confirmation: ConfirmationPolicy::Immediate,
            session_ttl: Duration::from_secs(3_600),
            tokens: TokenStore::memory(),
        }
    }
}

pub struct LocalIdentityProvider {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    options: LocalProviderOptions,
    events: broadcast::Sender<AuthNotification>,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, AuthError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| AuthError::Other(format!("Failed to parse timestamp '{s}': {e}")))
}

/// Columns `offset..offset+4`: id, email, `email_confirmed_at`, metadata.
fn row_to_identity(row: &libsql::Row, offset: i32) -> Result<AuthIdentity, AuthError> {
    let confirmed = row
        .get::<Option<String>>(offset + 2)?
        .map(|s| parse_timestamp(&s))
        .transpose()?;
    let metadata_raw = row.get::<String>(offset + 3)?;
    let metadata = serde_json::from_str(&metadata_raw)
        .map_err(|e| AuthError::Other(format!("unreadable identity metadata: {e}")))?;
    Ok(AuthIdentity {
        id: row.get::<String>(offset)?,
        email: row.get::<String>(offset + 1)?,
        email_confirmed_at: confirmed,
        metadata,
    })
}

fn row_to_session(row: &libsql::Row) -> Result<AuthSession, AuthError> {
    Ok(AuthSession {
        access_token: row.get::<String>(0)?,
        refresh_token: row.get::<String>(1)?,
        expires_at: parse_timestamp(&row.get::<String>(2)?)?,
        identity: row_to_identity(row, 3)?,
    })
}

impl LocalIdentityProvider {
    /// Open (or create) the provider's tables at `path` (or `":memory:"`).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the database cannot be opened or the
    /// migration fails.
    pub async fn open(path: &str, options: LocalProviderOptions) -> Result<Self, AuthError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        conn.execute_batch(MIGRATION_001).await?;
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Ok(Self {
            db,
            conn,
            options,
            events,
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.options.tokens
    }

    #[must_use]
    pub const fn confirmation_policy(&self) -> ConfirmationPolicy {
        self.options.confirmation
    }

    async fn find_identity(
        &self,
        email: &str,
    ) -> Result<Option<(AuthIdentity, String)>, AuthError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, email_confirmed_at, metadata, password_digest
                 FROM auth_identities WHERE email = ?1",
                [email],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let identity = row_to_identity(&row, 0)?;
                Ok(Some((identity, row.get::<String>(4)?)))
            }
            None => Ok(None),
        }
    }

    async fn find_session(&self, column: &str, token: &str) -> Result<Option<AuthSession>, AuthError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM auth_sessions s
                     JOIN auth_identities i ON i.id = s.identity_id
                     WHERE s.{column} = ?1"
                ),
                [token],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    /// Issue a fresh session for `identity` and make it the persisted one.
    async fn issue_session(&self, identity: AuthIdentity) -> Result<AuthSession, AuthError> {
        let ttl = chrono::TimeDelta::from_std(self.options.session_ttl)
            .map_err(|e| AuthError::Other(format!("session ttl out of range: {e}")))?;
        let session = AuthSession {
            access_token: generate_token()?,
            refresh_token: generate_token()?,
            expires_at: Utc::now() + ttl,
            identity,
        };
        self.conn
            .execute(
                "INSERT INTO auth_sessions (access_token, refresh_token, identity_id, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    session.access_token.as_str(),
                    session.refresh_token.as_str(),
                    session.identity.id.as_str(),
                    session.expires_at.to_rfc3339()
                ],
            )
            .await?;
        self.options.tokens.store(&session.to_stored())?;
        Ok(session)
    }

    async fn revoke(&self, access_token: &str) -> Result<(), AuthError> {
        self.conn
            .execute(
                "DELETE FROM auth_sessions WHERE access_token = ?1",
                [access_token],
            )
            .await?;
        Ok(())
    }

    /// Swap a refresh token for a new session.
    async fn rotate(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let Some(old) = self.find_session("refresh_token", refresh_token).await? else {
            self.options.tokens.delete()?;
            return Err(AuthError::SessionExpired);
        };
        self.revoke(&old.access_token).await?;
        let session = self.issue_session(old.identity).await?;
        tracing::debug!(user_id = %session.identity.id, "session refreshed");
        publish(
            &self.events,
            AuthNotification {
                event: AuthEvent::TokenRefreshed,
                session: Some(session.clone()),
            },
        );
        Ok(session)
    }

    /// Refresh the persisted session, emitting [`AuthEvent::TokenRefreshed`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if nothing is stored and
    /// `AuthError::SessionExpired` if the refresh token is no longer known.
    pub async fn refresh_session(&self) -> Result<AuthSession, AuthError> {
        let stored = self
            .options
            .tokens
            .load()
            .ok_or(AuthError::NotAuthenticated)?;
        let refresh_token = stored.refresh_token.ok_or(AuthError::SessionExpired)?;
        self.rotate(&refresh_token).await
    }

    /// Mark an identity's email as confirmed and sign it in.
    ///
    /// Stands in for the confirmation link a hosted provider would email.
    /// Emits [`AuthEvent::SignedIn`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if no identity uses this email.
    pub async fn confirm_email(&self, email: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let Some((mut identity, _)) = self.find_identity(&email).await? else {
            return Err(AuthError::Provider("User not found".into()));
        };
        if identity.email_confirmed_at.is_none() {
            let now = Utc::now();
            self.conn
                .execute(
                    "UPDATE auth_identities SET email_confirmed_at = ?2
                     WHERE id = ?1 AND email_confirmed_at IS NULL",
                    libsql::params![identity.id.as_str(), now.to_rfc3339()],
                )
                .await?;
            identity.email_confirmed_at = Some(now);
            tracing::info!(user_id = %identity.id, "email confirmed");
        }
        let session = self.issue_session(identity).await?;
        publish(
            &self.events,
            AuthNotification {
                event: AuthEvent::SignedIn,
                session: Some(session.clone()),
            },
        );
        Ok(session)
    }

    /// Replace the signed-in identity's metadata, emitting
    /// [`AuthEvent::UserUpdated`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if there is no current session.
    pub async fn update_metadata(&self, metadata: &SignupMetadata) -> Result<AuthSession, AuthError> {
        let mut session = self
            .current_session()
            .await?
            .ok_or(AuthError::NotAuthenticated)?;
        let raw = serde_json::to_string(metadata)
            .map_err(|e| AuthError::Other(format!("serialize metadata: {e}")))?;
        self.conn
            .execute(
                "UPDATE auth_identities SET metadata = ?2 WHERE id = ?1",
                libsql::params![session.identity.id.as_str(), raw],
            )
            .await?;
        session.identity.metadata = metadata.clone();
        publish(
            &self.events,
            AuthNotification {
                event: AuthEvent::UserUpdated,
                session: Some(session.clone()),
            },
        );
        Ok(session)
    }
}

impl IdentityProvider for LocalIdentityProvider {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(stored) = self.options.tokens.load() else {
            return Ok(None);
        };
        let Some(session) = self.find_session("access_token", &stored.access_token).await? else {
            tracing::debug!("stored session is no longer known; clearing");
            self.options.tokens.delete()?;
            return Ok(None);
        };
        if !session.is_near_expiry(EXPIRY_BUFFER_SECS) {
            return Ok(Some(session));
        }
        match self.rotate(&session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(AuthError::SessionExpired) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let Some((identity, digest)) = self.find_identity(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        let candidate = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || verify_password(&candidate, &digest))
            .await
            .map_err(|e| AuthError::Other(format!("password check failed: {e}")))?;
        if !verified {
            return Err(AuthError::InvalidCredentials);
        }
        if !identity.is_confirmed() {
            return Err(AuthError::EmailNotConfirmed);
        }
        let session = self.issue_session(identity).await?;
        tracing::info!(user_id = %session.identity.id, "signed in");
        publish(
            &self.events,
            AuthNotification {
                event: AuthEvent::SignedIn,
                session: Some(session.clone()),
            },
        );
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignUpResponse, AuthError> {
        let email = normalize_email(email);
        check_email(&email)?;
        check_strength(password)?;
        if self.find_identity(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let confirmed_at = match self.options.confirmation {
            ConfirmationPolicy::Immediate => Some(Utc::now()),
            ConfirmationPolicy::EmailLink => None,
        };
        let identity = AuthIdentity {
            id: generate_subject_id(),
            email,
            email_confirmed_at: confirmed_at,
            metadata: metadata.clone(),
        };
        let secret = password.to_owned();
        let digest = tokio::task::spawn_blocking(move || hash_password(&secret))
            .await
            .map_err(|e| AuthError::Other(format!("password hashing failed: {e}")))??;
        let metadata_raw = serde_json::to_string(metadata)
            .map_err(|e| AuthError::Other(format!("serialize metadata: {e}")))?;
        let confirmed_value = confirmed_at.map_or(libsql::Value::Null, |at| at.to_rfc3339().into());
        self.conn
            .execute(
                "INSERT INTO auth_identities (id, email, password_digest, email_confirmed_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    identity.id.as_str(),
                    identity.email.as_str(),
                    digest,
                    confirmed_value,
                    metadata_raw
                ],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    AuthError::DuplicateEmail
                } else {
                    AuthError::Storage(e)
                }
            })?;
        tracing::info!(user_id = %identity.id, confirmed = confirmed_at.is_some(), "identity created");

        if confirmed_at.is_none() {
            return Ok(SignUpResponse {
                identity,
                session: None,
            });
        }
        let session = self.issue_session(identity.clone()).await?;
        publish(
            &self.events,
            AuthNotification {
                event: AuthEvent::SignedIn,
                session: Some(session.clone()),
            },
        );
        Ok(SignUpResponse {
            identity,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(stored) = self.options.tokens.load() {
            self.revoke(&stored.access_token).await?;
        }
        self.options.tokens.delete()?;
        publish(
            &self.events,
            AuthNotification {
                event: AuthEvent::SignedOut,
                session: None,
            },
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        self.events.subscribe()
    }
}
