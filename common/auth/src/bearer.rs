use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::{AuthError, AuthResult};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Returns the credential following `Bearer ` in the `Authorization` header.
///
/// The scheme match is case-sensitive and the remainder is returned verbatim.
pub fn extract_bearer(headers: &HeaderMap) -> AuthResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;
    if value.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let raw = value
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    raw.strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extract_bearer_accepts_valid_token() {
        let headers = headers("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers).expect("token"), "abc.def.ghi");
    }

    #[test]
    fn extract_bearer_keeps_remainder_verbatim() {
        let headers = headers("Bearer  abc def ");
        assert_eq!(extract_bearer(&headers).expect("token"), " abc def ");
    }

    #[test]
    fn extract_bearer_rejects_missing_header() {
        let err = extract_bearer(&HeaderMap::new()).expect_err("should reject");
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[test]
    fn extract_bearer_rejects_empty_header() {
        let err = extract_bearer(&headers("")).expect_err("should reject");
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[test]
    fn extract_bearer_rejects_non_visible_ascii() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff").expect("opaque header bytes"),
        );
        let err = extract_bearer(&headers).expect_err("should reject");
        assert_eq!(err, AuthError::MalformedCredential);
    }

    #[test]
    fn extract_bearer_rejects_wrong_scheme() {
        for value in ["Basic credentials", "bearer abc", "BEARER abc", "Bearerabc", "Bearer"] {
            let err = extract_bearer(&headers(value)).expect_err("should reject");
            assert_eq!(err, AuthError::MalformedCredential, "{value}");
        }
    }
}
