use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gate_http_errors::Denial;

use crate::roles::RoleValue;

/// Role admitted by a [`RoleGate`](crate::RoleGate), available to handlers
/// behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedRole<T>(pub T);

impl<T> GrantedRole<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for GrantedRole<T>
where
    T: RoleValue,
    S: Send + Sync,
{
    type Rejection = Denial;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GrantedRole<T>>()
            .cloned()
            .ok_or_else(|| Denial::unauthorized("request did not pass an authorization gate"))
    }
}
