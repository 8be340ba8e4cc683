use axum::response::{IntoResponse, Response};
use gate_http_errors::Denial;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// What callers see when the gate itself is misconfigured.
const CONFIGURATION_MESSAGE: &str = "authorization unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("signing secret not configured: {0}")]
    Configuration(String),
    #[error("authorization header missing")]
    MissingCredential,
    #[error("authorization header malformed")]
    MalformedCredential,
    #[error("invalid token: {0}")]
    MalformedToken(&'static str),
    #[error("invalid token: unexpected signing method '{0}'")]
    UnexpectedAlgorithm(String),
    #[error("invalid token: signature mismatch")]
    BadSignature,
    #[error("invalid token: token has expired")]
    Expired,
    #[error("missing subject claim")]
    MissingSubjectClaim,
    #[error("invalid role claim '{0}'")]
    InvalidRoleClaim(String),
    #[error("permission denied for {0}")]
    AccessDenied(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    /// Operator misconfiguration rather than a caller mistake.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthError::Configuration(_))
    }

    /// Signature, algorithm, expiry or encoding failures.
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken(_)
                | AuthError::UnexpectedAlgorithm(_)
                | AuthError::BadSignature
                | AuthError::Expired
        )
    }
}

impl From<AuthError> for Denial {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::AccessDenied(_) => Denial::forbidden(value.to_string()),
            AuthError::Configuration(_) => Denial::unauthorized(CONFIGURATION_MESSAGE),
            other => Denial::unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        Denial::from(self).into_response()
    }
}
