//! Hosted GoTrue-compatible auth API over HTTP.
//!
//! Talks to `{url}/auth/v1/*` with the project's public anon key. The session
//! from the last sign-in is persisted through a [`TokenStore`]; near-expiry
//! sessions are refreshed with the stored refresh token when read back.

use std::time::Duration;

use chair_core::enums::AuthEvent;
use chair_core::identity::{AuthIdentity, SignupMetadata};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::jwt::decode_expiry;
use crate::provider::{IdentityProvider, NOTIFICATION_CAPACITY, publish};
use crate::session::{
    AuthNotification, AuthSession, EXPIRY_BUFFER_SECS, SignUpResponse, StoredSession,
};
use crate::token_store::TokenStore;

/// Lifetime assumed for tokens whose expiry cannot be read.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3_600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl UserPayload {
    fn into_identity(self) -> AuthIdentity {
        let metadata: SignupMetadata =
            serde_json::from_value(self.user_metadata).unwrap_or_default();
        AuthIdentity {
            id: self.id,
            email: self.email.unwrap_or_default(),
            email_confirmed_at: self.email_confirmed_at,
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

impl SessionPayload {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|at| DateTime::from_timestamp(at, 0))
            .unwrap_or_else(|| {
                Utc::now()
                    + chrono::TimeDelta::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            });
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            identity: self.user.into_identity(),
        }
    }
}

/// Sign-up returns a session when the project confirms immediately, and the
/// bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(SessionPayload),
    User(UserPayload),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Translate an error response body into an [`AuthError`].
fn map_api_error(status: StatusCode, body: &str) -> AuthError {
    let payload: ErrorPayload = serde_json::from_str(body).unwrap_or_default();
    let message = payload
        .msg
        .or(payload.message)
        .or(payload.error_description)
        .or(payload.error)
        .unwrap_or_else(|| format!("HTTP {status}"));

    match payload.error_code.as_deref() {
        Some("invalid_credentials") => return AuthError::InvalidCredentials,
        Some("email_not_confirmed") => return AuthError::EmailNotConfirmed,
        Some("user_already_exists" | "email_exists") => return AuthError::DuplicateEmail,
        Some("weak_password") => return AuthError::WeakPassword(message),
        Some("email_address_invalid" | "validation_failed") if message.contains("email") => {
            return AuthError::InvalidEmail;
        }
        Some(
            "refresh_token_not_found"
            | "refresh_token_already_used"
            | "session_expired"
            | "session_not_found"
            | "bad_jwt",
        ) => return AuthError::SessionExpired,
        _ => {}
    }

    // Older deployments report only a message.
    match message.as_str() {
        "Invalid login credentials" => AuthError::InvalidCredentials,
        "Email not confirmed" => AuthError::EmailNotConfirmed,
        "User already registered" => AuthError::DuplicateEmail,
        "Invalid Refresh Token: Refresh Token Not Found" => AuthError::SessionExpired,
        _ => AuthError::Provider(message),
    }
}

pub struct GoTrueProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    redirect_to: Option<String>,
    tokens: TokenStore,
    events: broadcast::Sender<AuthNotification>,
}

impl GoTrueProvider {
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the HTTP client cannot be built.
    pub fn new(
        url: &str,
        anon_key: impl Into<String>,
        tokens: TokenStore,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            redirect_to: None,
            tokens,
            events,
        })
    }

    /// Where the confirmation email should send the user.
    #[must_use]
    pub fn with_redirect_to(mut self, url: impl Into<String>) -> Self {
        self.redirect_to = Some(url.into());
        self
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn signup_endpoint(&self) -> String {
        match &self.redirect_to {
            Some(redirect) => format!(
                "{}?redirect_to={}",
                self.endpoint("signup"),
                urlencoding::encode(redirect)
            ),
            None => self.endpoint("signup"),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<T, AuthError> {
        let response = request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(map_api_error(status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| AuthError::Other(format!("unexpected auth response: {e}")))
    }

    fn start_session(
        &self,
        payload: SessionPayload,
        event: AuthEvent,
    ) -> Result<AuthSession, AuthError> {
        let session = payload.into_session();
        self.tokens.store(&session.to_stored())?;
        publish(
            &self.events,
            AuthNotification {
                event,
                session: Some(session.clone()),
            },
        );
        Ok(session)
    }

    async fn refresh_with(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let request = self
            .client
            .post(self.endpoint("token?grant_type=refresh_token"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }));
        let payload: SessionPayload = self.send(request, None).await?;
        tracing::debug!("session refreshed");
        self.start_session(payload, AuthEvent::TokenRefreshed)
    }

    /// Refresh the persisted session, emitting [`AuthEvent::TokenRefreshed`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if nothing is stored and
    /// `AuthError::SessionExpired` if the refresh token was rejected.
    pub async fn refresh_session(&self) -> Result<AuthSession, AuthError> {
        let stored = self.tokens.load().ok_or(AuthError::NotAuthenticated)?;
        let refresh_token = stored.refresh_token.ok_or(AuthError::SessionExpired)?;
        self.refresh_with(&refresh_token).await
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<AuthIdentity>, AuthError> {
        let request = self.client.get(self.endpoint("user"));
        match self.send::<UserPayload>(request, Some(access_token)).await {
            Ok(user) => Ok(Some(user.into_identity())),
            Err(AuthError::SessionExpired) => Ok(None),
            Err(AuthError::Provider(message)) if is_rejected_token(&message) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn forget(&self) -> Result<(), AuthError> {
        self.tokens.delete()
    }
}

fn is_rejected_token(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("jwt") || message.contains("invalid claim")
}

fn resolve_expiry(stored: &StoredSession) -> Option<DateTime<Utc>> {
    stored
        .expires_at
        .or_else(|| decode_expiry(&stored.access_token).ok())
}

impl IdentityProvider for GoTrueProvider {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(stored) = self.tokens.load() else {
            return Ok(None);
        };
        let expires_at = resolve_expiry(&stored);
        let near_expiry = expires_at.is_some_and(|at| {
            at <= Utc::now() + chrono::TimeDelta::seconds(EXPIRY_BUFFER_SECS)
        });

        if near_expiry {
            let Some(refresh_token) = stored.refresh_token.as_deref() else {
                tracing::debug!("stored token expired and cannot be refreshed");
                self.forget()?;
                return Ok(None);
            };
            return match self.refresh_with(refresh_token).await {
                Ok(session) => Ok(Some(session)),
                Err(AuthError::SessionExpired) => {
                    self.forget()?;
                    Ok(None)
                }
                Err(error) => Err(error),
            };
        }

        let Some(identity) = self.fetch_user(&stored.access_token).await? else {
            tracing::debug!("stored token rejected by provider; clearing");
            self.forget()?;
            return Ok(None);
        };
        Ok(Some(AuthSession {
            expires_at: expires_at.unwrap_or_else(|| {
                Utc::now() + chrono::TimeDelta::seconds(DEFAULT_EXPIRES_IN_SECS)
            }),
            access_token: stored.access_token,
            refresh_token: stored.refresh_token.unwrap_or_default(),
            identity,
        }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let request = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let payload: SessionPayload = self.send(request, None).await?;
        let session = self.start_session(payload, AuthEvent::SignedIn)?;
        tracing::info!(user_id = %session.identity.id, "signed in");
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignUpResponse, AuthError> {
        let request = self.client.post(self.signup_endpoint()).json(&serde_json::json!({
            "email": email,
            "password": password,
            "data": metadata,
        }));
        match self.send::<SignUpPayload>(request, None).await? {
            SignUpPayload::Session(payload) => {
                let session = self.start_session(payload, AuthEvent::SignedIn)?;
                Ok(SignUpResponse {
                    identity: session.identity.clone(),
                    session: Some(session),
                })
            }
            SignUpPayload::User(user) => Ok(SignUpResponse {
                identity: user.into_identity(),
                session: None,
            }),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(stored) = self.tokens.load() {
            let request = self.client.post(self.endpoint("logout"));
            let response = request
                .header("apikey", &self.anon_key)
                .bearer_auth(&stored.access_token)
                .send()
                .await;
            match response {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "provider sign-out rejected");
                }
                Err(error) => tracing::warn!(%error, "provider sign-out failed"),
                Ok(_) => {}
            }
        }
        self.forget()?;
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
