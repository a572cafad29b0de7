//! Password hashing and random identifiers for the local provider.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::AuthError;

/// Shortest password the local provider accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

const SALT_LEN: usize = 16;

fn random_bytes<const N: usize>() -> Result<[u8; N], AuthError> {
    let mut bytes = [0u8; N];
    getrandom::fill(&mut bytes)
        .map_err(|e| AuthError::Other(format!("failed to gather randomness: {e}")))?;
    Ok(bytes)
}

/// Reject passwords below [`MIN_PASSWORD_LEN`] characters.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with the provider's wording.
pub fn check_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// Argon2id hash of `password` as a PHC string (`$argon2id$v=19$...`).
///
/// # Errors
///
/// Returns `AuthError::Other` if the OS random source or the hasher fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(&random_bytes::<SALT_LEN>()?)
        .map_err(|e| AuthError::Other(format!("failed to encode salt: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Other(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Check `password` against a PHC string produced by [`hash_password`].
/// Unparseable hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Opaque URL-safe token for access and refresh tokens.
///
/// # Errors
///
/// Returns `AuthError::Other` if the OS random source fails.
pub fn generate_token() -> Result<String, AuthError> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<32>()?))
}

/// Random identity id (UUID v4).
#[must_use]
pub fn generate_subject_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Lower-cased, trimmed email address. Emails compare case-insensitively.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: something on both sides of a single `@`, and a dot in
/// the domain.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` otherwise.
pub fn check_email(email: &str) -> Result<(), AuthError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail)
    }
}
