use base64::Engine as _;

use crate::error::AuthError;

/// Decode JWT `exp` claim without signature validation (for quick expiry checks).
///
/// Used to give tokens supplied through the environment an expiry. The provider
/// still verifies the token on every request.
///
/// # Errors
///
/// Returns `AuthError::Other` if the JWT format is invalid or the `exp` claim
/// is missing or cannot be parsed.
pub fn decode_expiry(jwt: &str) -> Result<chrono::DateTime<chrono::Utc>, AuthError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::Other("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::Other(format!("base64 decode failed: {e}")))?;
    let value: serde_json::Value = serde_json::from_slice(&payload)
        .map_err(|e| AuthError::Other(format!("JSON parse failed: {e}")))?;
    let exp = value["exp"]
        .as_i64()
        .ok_or_else(|| AuthError::Other("missing exp claim".into()))?;
    chrono::DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| AuthError::Other("invalid exp timestamp".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(part: &str) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(part)
    }

    fn make_jwt(payload: &str) -> String {
        format!(
            "{}.{}.{}",
            encode(r#"{"alg":"HS256"}"#),
            encode(payload),
            encode("sig")
        )
    }

    #[test]
    fn decodes_exp_claim() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let jwt = make_jwt(&format!(r#"{{"sub":"u-1","role":"authenticated","exp":{exp}}}"#));
        assert_eq!(decode_expiry(&jwt).unwrap().timestamp(), exp);
    }

    #[test]
    fn rejects_opaque_token() {
        let err = decode_expiry("not-a-jwt").unwrap_err();
        assert!(err.to_string().contains("invalid JWT format"));
    }

    #[test]
    fn rejects_missing_exp() {
        let err = decode_expiry(&make_jwt(r#"{"sub":"u-1"}"#)).unwrap_err();
        assert!(err.to_string().contains("missing exp claim"));
    }

    #[test]
    fn rejects_bad_base64() {
        let err = decode_expiry("header.!!!invalid!!!.signature").unwrap_err();
        assert!(err.to_string().contains("base64 decode failed"));
    }
}
