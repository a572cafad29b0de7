use std::time::Duration;

use chair_auth::{
    AuthError, ConfirmationPolicy, IdentityProvider, LocalIdentityProvider, LocalProviderOptions,
    TokenStore,
};
use chair_core::enums::AuthEvent;
use chair_core::identity::SignupMetadata;
use pretty_assertions::assert_eq;

fn metadata() -> SignupMetadata {
    SignupMetadata {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        school: "State University".into(),
        organization: "Alpha Beta".into(),
        chapter_code: "AB-1".into(),
        role_name: "Social Chair".into(),
    }
}

async fn provider(confirmation: ConfirmationPolicy) -> LocalIdentityProvider {
    LocalIdentityProvider::open(
        ":memory:",
        LocalProviderOptions {
            confirmation,
            session_ttl: Duration::from_secs(3_600),
            tokens: TokenStore::memory(),
        },
    )
    .await
    .expect("open provider")
}

#[tokio::test]
async fn immediate_sign_up_issues_session_and_notifies() {
    let provider = provider(ConfirmationPolicy::Immediate).await;
    let mut events = provider.subscribe();

    let response = provider
        .sign_up("Ada@Example.edu", "hunter22", &metadata())
        .await
        .unwrap();
    assert!(!response.needs_confirmation());
    assert!(response.identity.is_confirmed());
    assert_eq!(response.identity.email, "ada@example.edu");
    assert_eq!(response.identity.metadata, metadata());

    let notification = events.recv().await.unwrap();
    assert_eq!(notification.event, AuthEvent::SignedIn);
    assert_eq!(notification.identity().map(|i| i.id.as_str()), Some(response.identity.id.as_str()));

    let current = provider.current_session().await.unwrap().expect("session persisted");
    assert_eq!(current.identity.id, response.identity.id);
    assert_eq!(current.identity.metadata, metadata());
}

#[tokio::test]
async fn deferred_sign_up_waits_for_confirmation() {
    let provider = provider(ConfirmationPolicy::EmailLink).await;
    let response = provider
        .sign_up("bob@example.edu", "hunter22", &metadata())
        .await
        .unwrap();
    assert!(response.needs_confirmation());
    assert!(provider.current_session().await.unwrap().is_none());

    let err = provider
        .sign_in_with_password("bob@example.edu", "hunter22")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailNotConfirmed));

    let mut events = provider.subscribe();
    let session = provider.confirm_email("BOB@example.edu").await.unwrap();
    assert!(session.identity.is_confirmed());
    assert_eq!(session.identity.id, response.identity.id);
    assert_eq!(events.recv().await.unwrap().event, AuthEvent::SignedIn);

    provider
        .sign_in_with_password("bob@example.edu", "hunter22")
        .await
        .expect("confirmed identity can sign in");
}

#[tokio::test]
async fn rejects_duplicate_weak_and_malformed_sign_ups() {
    let provider = provider(ConfirmationPolicy::Immediate).await;
    provider
        .sign_up("ada@example.edu", "hunter22", &metadata())
        .await
        .unwrap();

    let dup = provider
        .sign_up("ADA@example.edu", "hunter22", &metadata())
        .await
        .unwrap_err();
    assert!(matches!(dup, AuthError::DuplicateEmail));

    let weak = provider
        .sign_up("new@example.edu", "12345", &metadata())
        .await
        .unwrap_err();
    assert!(matches!(weak, AuthError::WeakPassword(_)));

    let malformed = provider
        .sign_up("not-an-email", "hunter22", &metadata())
        .await
        .unwrap_err();
    assert!(matches!(malformed, AuthError::InvalidEmail));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let provider = provider(ConfirmationPolicy::Immediate).await;
    provider
        .sign_up("ada@example.edu", "hunter22", &metadata())
        .await
        .unwrap();

    let wrong = provider
        .sign_in_with_password("ada@example.edu", "hunter23")
        .await
        .unwrap_err();
    let unknown = provider
        .sign_in_with_password("nobody@example.edu", "hunter22")
        .await
        .unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert!(matches!(wrong, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn sign_out_revokes_session_and_notifies() {
    let provider = provider(ConfirmationPolicy::Immediate).await;
    provider
        .sign_up("ada@example.edu", "hunter22", &metadata())
        .await
        .unwrap();
    let mut events = provider.subscribe();

    provider.sign_out().await.unwrap();
    let notification = events.recv().await.unwrap();
    assert_eq!(notification.event, AuthEvent::SignedOut);
    assert!(notification.session.is_none());
    assert!(provider.current_session().await.unwrap().is_none());
    assert!(provider.tokens().load().is_none());

    // Signing out twice is harmless
    provider.sign_out().await.unwrap();
}

#[tokio::test]
async fn refresh_rotates_tokens() {
    let provider = provider(ConfirmationPolicy::Immediate).await;
    let first = provider
        .sign_up("ada@example.edu", "hunter22", &metadata())
        .await
        .unwrap()
        .session
        .unwrap();
    let mut events = provider.subscribe();

    let refreshed = provider.refresh_session().await.unwrap();
    assert_ne!(refreshed.access_token, first.access_token);
    assert_eq!(refreshed.identity.id, first.identity.id);
    assert_eq!(events.recv().await.unwrap().event, AuthEvent::TokenRefreshed);

    let current = provider.current_session().await.unwrap().unwrap();
    assert_eq!(current.access_token, refreshed.access_token);
}

#[tokio::test]
async fn expired_session_is_refreshed_on_read() {
    let provider = LocalIdentityProvider::open(
        ":memory:",
        LocalProviderOptions {
            confirmation: ConfirmationPolicy::Immediate,
            // Inside the expiry buffer from the moment it is issued
            session_ttl: Duration::from_secs(10),
            tokens: TokenStore::memory(),
        },
    )
    .await
    .unwrap();
    let first = provider
        .sign_up("ada@example.edu", "hunter22", &metadata())
        .await
        .unwrap()
        .session
        .unwrap();
    let mut events = provider.subscribe();

    let current = provider.current_session().await.unwrap().unwrap();
    assert_ne!(current.access_token, first.access_token);
    assert_eq!(events.recv().await.unwrap().event, AuthEvent::TokenRefreshed);
}

#[tokio::test]
async fn update_metadata_notifies_user_updated() {
    let provider = provider(ConfirmationPolicy::Immediate).await;
    provider
        .sign_up("ada@example.edu", "hunter22", &SignupMetadata::default())
        .await
        .unwrap();
    let mut events = provider.subscribe();

    let session = provider.update_metadata(&metadata()).await.unwrap();
    assert_eq!(session.identity.metadata, metadata());
    assert_eq!(events.recv().await.unwrap().event, AuthEvent::UserUpdated);

    let current = provider.current_session().await.unwrap().unwrap();
    assert_eq!(current.identity.metadata.role_name, "Social Chair");
}

#[tokio::test]
async fn session_survives_reopen_with_file_backing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("auth.db");
    let db_path = db_path.to_str().unwrap();
    let tokens = TokenStore::file(dir.path().join("session"));
    let options = LocalProviderOptions {
        tokens,
        ..LocalProviderOptions::default()
    };

    let user_id = {
        let provider = LocalIdentityProvider::open(db_path, options.clone()).await.unwrap();
        provider
            .sign_up("ada@example.edu", "hunter22", &metadata())
            .await
            .unwrap()
            .identity
            .id
    };

    let provider = LocalIdentityProvider::open(db_path, options).await.unwrap();
    let session = provider.current_session().await.unwrap().expect("persisted session");
    assert_eq!(session.identity.id, user_id);
}

#[tokio::test]
async fn stored_password_is_an_argon2id_hash() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("auth.db");
    let db_path = db_path.to_str().unwrap();

    let provider = LocalIdentityProvider::open(db_path, LocalProviderOptions::default())
        .await
        .unwrap();
    provider
        .sign_up("ada@example.edu", "hunter22", &metadata())
        .await
        .unwrap();

    let conn = libsql::Builder::new_local(db_path)
        .build()
        .await
        .unwrap()
        .connect()
        .unwrap();
    let mut rows = conn
        .query(
            "SELECT password_digest FROM auth_identities WHERE email = ?1",
            libsql::params!["ada@example.edu"],
        )
        .await
        .unwrap();
    let row = rows.next().await.unwrap().expect("identity row");
    let stored: String = row.get(0).unwrap();

    assert!(stored.starts_with("$argon2id$v=19$"));
    assert!(!stored.contains("hunter22"));
    provider
        .sign_in_with_password("ada@example.edu", "hunter22")
        .await
        .expect("hash should verify");
}
