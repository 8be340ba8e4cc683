use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::claims::{issue_payload, Claims};
use crate::error::{AuthError, AuthResult};
use crate::secret::SecretProvider;

/// The only algorithm issued or accepted.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const SIGNING_ALGORITHM_NAME: &str = "HS256";

/// Upper bound on how much of an untrusted `alg` value is echoed back.
const MAX_REPORTED_ALG_LEN: usize = 16;

/// Issues and verifies compact HS256 tokens with a lazily resolved secret.
#[derive(Clone, Debug)]
pub struct TokenCodec {
    secrets: Arc<SecretProvider>,
}

impl TokenCodec {
    pub fn new(secrets: Arc<SecretProvider>) -> Self {
        Self { secrets }
    }

    pub fn secrets(&self) -> &SecretProvider {
        &self.secrets
    }

    /// Signs `subject` with an expiry of now + `ttl`. A negative `ttl` yields an
    /// already expired token.
    pub fn sign<S: Serialize + ?Sized>(&self, subject: &S, ttl: Duration) -> AuthResult<String> {
        let secret = self.secrets.resolve()?;
        let exp = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing("ttl out of range".to_string()))?
            .timestamp();

        let subject = serde_json::to_value(subject)
            .map_err(|err| AuthError::Signing(err.to_string()))?;
        let payload = issue_payload(subject, exp);

        let header = Header::new(SIGNING_ALGORITHM);
        encode(&header, &payload, &EncodingKey::from_secret(secret.as_bytes())).map_err(|err| {
            error!(error = %err, "failed to sign token");
            AuthError::Signing(err.to_string())
        })
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies `token` as of the Unix second `now`; valid only while `now < exp`.
    pub fn verify_at(&self, token: &str, now: i64) -> AuthResult<Claims> {
        let alg = declared_algorithm(token)?;
        if alg != SIGNING_ALGORITHM_NAME {
            return Err(AuthError::UnexpectedAlgorithm(
                alg.chars().take(MAX_REPORTED_ALG_LEN).collect(),
            ));
        }

        let secret = self.secrets.resolve()?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        validation.leeway = 0;

        let data = decode::<Map<String, Value>>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(classify)?;

        let claims = Claims::from_map(data.claims)?;
        let exp = claims.expires_at();
        if exp <= now {
            return Err(AuthError::Expired);
        }

        debug!(exp, "verified token successfully");
        Ok(claims)
    }
}

/// Reads the `alg` a token claims for itself without trusting it for anything
/// beyond the pinning check.
fn declared_algorithm(token: &str) -> AuthResult<String> {
    let mut parts = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::MalformedToken("expected three segments"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken("header is not base64url"))?;
    let header: Value = serde_json::from_slice(&bytes)
        .map_err(|_| AuthError::MalformedToken("header is not JSON"))?;

    match header.get("alg") {
        Some(Value::String(alg)) => Ok(alg.clone()),
        Some(_) => Err(AuthError::UnexpectedAlgorithm("non-string".to_string())),
        None => Err(AuthError::UnexpectedAlgorithm("missing".to_string())),
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            AuthError::UnexpectedAlgorithm(SIGNING_ALGORITHM_NAME.to_string())
        }
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::Base64(_) => AuthError::MalformedToken("segment is not base64url"),
        ErrorKind::Json(_) | ErrorKind::Utf8(_) => AuthError::MalformedToken("payload is not a JSON object"),
        _ => AuthError::MalformedToken("undecodable token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(Arc::new(SecretProvider::from_static(secret)))
    }

    fn forge(header: Value, payload: Value, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(payload.to_string()),
            signature
        )
    }

    #[test]
    fn round_trip_preserves_subject_fields() {
        let codec = codec("s3cr3t");
        let token = codec
            .sign(&json!({"role": "admin", "name": "ada"}), Duration::minutes(5))
            .expect("sign");
        let claims = codec.verify(&token).expect("verify");
        assert_eq!(claims.get("role"), Some(&json!("admin")));
        assert_eq!(claims.get("name"), Some(&json!("ada")));
        assert!(claims.expires_at() > Utc::now().timestamp());
    }

    #[test]
    fn header_declares_hs256() {
        let token = codec("s3cr3t").sign(&json!("viewer"), Duration::hours(1)).unwrap();
        assert_eq!(declared_algorithm(&token).unwrap(), "HS256");
    }

    #[test]
    fn different_secret_is_bad_signature() {
        let token = codec("s1").sign(&json!({"role": "admin"}), Duration::hours(1)).unwrap();
        let err = codec("s2").verify(&token).expect_err("should fail");
        assert_eq!(err, AuthError::BadSignature);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec("s3cr3t");
        let token = codec.sign(&json!({"role": "admin"}), Duration::seconds(-1)).unwrap();
        assert_eq!(codec.verify(&token).expect_err("expired"), AuthError::Expired);

        let fresh = codec.sign(&json!({"role": "admin"}), Duration::hours(1)).unwrap();
        assert!(codec.verify(&fresh).is_ok());
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let codec = codec("s3cr3t");
        let token = codec.sign(&json!({"role": "admin"}), Duration::hours(1)).unwrap();
        let exp = codec.verify(&token).unwrap().expires_at();
        assert!(codec.verify_at(&token, exp - 1).is_ok());
        assert_eq!(codec.verify_at(&token, exp).unwrap_err(), AuthError::Expired);
        assert_eq!(codec.verify_at(&token, exp + 1).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn none_algorithm_is_rejected() {
        let token = forge(json!({"alg": "none", "typ": "JWT"}), json!({"role": "admin", "exp": i64::MAX}), "");
        let err = codec("s3cr3t").verify(&token).expect_err("alg none");
        assert_eq!(err, AuthError::UnexpectedAlgorithm("none".to_string()));
    }

    #[test]
    fn asymmetric_and_other_hmac_algorithms_are_rejected() {
        for alg in ["RS256", "ES256", "HS512"] {
            let token = forge(json!({"alg": alg}), json!({"exp": i64::MAX}), "c2ln");
            let err = codec("s3cr3t").verify(&token).expect_err("pinned alg");
            assert_eq!(err, AuthError::UnexpectedAlgorithm(alg.to_string()));
        }
    }

    #[test]
    fn missing_alg_is_rejected() {
        let token = forge(json!({"typ": "JWT"}), json!({"exp": i64::MAX}), "c2ln");
        assert!(matches!(
            codec("s3cr3t").verify(&token),
            Err(AuthError::UnexpectedAlgorithm(_))
        ));
    }

    #[test]
    fn reported_algorithm_is_truncated() {
        let long = "X".repeat(200);
        let token = forge(json!({"alg": long}), json!({"exp": i64::MAX}), "c2ln");
        match codec("s3cr3t").verify(&token) {
            Err(AuthError::UnexpectedAlgorithm(alg)) => assert_eq!(alg.len(), MAX_REPORTED_ALG_LEN),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_structure_is_rejected() {
        let codec = codec("s3cr3t");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.e30.sig"] {
            assert!(
                matches!(codec.verify(token), Err(AuthError::MalformedToken(_))),
                "{token}"
            );
        }
    }

    #[test]
    fn tampered_payload_is_bad_signature() {
        let codec = codec("s3cr3t");
        let token = codec.sign(&json!({"role": "viewer"}), Duration::hours(1)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            json!({"role": "admin", "exp": Utc::now().timestamp() + 3600}).to_string(),
        );
        parts[1] = &forged_payload;
        let err = codec.verify(&parts.join(".")).expect_err("tampered");
        assert_eq!(err, AuthError::BadSignature);
    }

    #[test]
    fn missing_secret_fails_sign_and_verify() {
        let codec = TokenCodec::new(Arc::new(SecretProvider::from_env_var(
            "GATE_AUTH_CODEC_TEST_UNSET",
        )));
        assert!(codec
            .sign(&json!({"role": "admin"}), Duration::minutes(5))
            .unwrap_err()
            .is_configuration());

        let token = forge(json!({"alg": "HS256"}), json!({"exp": i64::MAX}), "c2ln");
        assert!(codec.verify(&token).unwrap_err().is_configuration());
    }
}
