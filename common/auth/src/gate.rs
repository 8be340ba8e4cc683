use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use gate_http_errors::Denial;
use tracing::{debug, error, warn};

use crate::access::AllowSet;
use crate::bearer::extract_bearer;
use crate::codec::TokenCodec;
use crate::config::{DenialPolicy, GateConfig};
use crate::error::{AuthError, AuthResult};
use crate::extractors::GrantedRole;
use crate::projector::{FieldRole, RoleExtractor, SubjectRole};
use crate::roles::RoleValue;

/// Upper bound on how much of a refused role value is echoed back.
const MAX_REPORTED_ROLE_LEN: usize = 64;

/// Authorization gate: bearer extraction, verification, claim projection and the
/// allow-set decision, in that order, stopping at the first failure.
///
/// Cheap to clone; every clone shares the same immutable allow set.
pub struct RoleGate<T: RoleValue> {
    inner: Arc<GateInner<T>>,
}

struct GateInner<T: RoleValue> {
    codec: TokenCodec,
    extractor: Box<dyn RoleExtractor<T>>,
    allowed: AllowSet<T>,
    policy: DenialPolicy,
}

impl<T: RoleValue> Clone for RoleGate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: RoleValue> fmt::Debug for RoleGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleGate")
            .field("allowed", &self.inner.allowed.describe())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl<T: RoleValue> RoleGate<T> {
    pub fn with_extractor(
        config: &GateConfig,
        codec: TokenCodec,
        extractor: impl RoleExtractor<T> + 'static,
        allowed: AllowSet<T>,
    ) -> Self {
        Self {
            inner: Arc::new(GateInner {
                codec,
                extractor: Box::new(extractor),
                allowed,
                policy: config.denial_policy,
            }),
        }
    }

    /// Gate reading the role from `config.role_field` of the claims mapping.
    pub fn field(config: &GateConfig, codec: TokenCodec, allowed: AllowSet<T>) -> Self {
        Self::with_extractor(config, codec, FieldRole::new(config.role_field.clone()), allowed)
    }

    /// Gate reading the role from the flat `sub` claim.
    pub fn subject(config: &GateConfig, codec: TokenCodec, allowed: AllowSet<T>) -> Self {
        Self::with_extractor(config, codec, SubjectRole::new(), allowed)
    }

    pub fn allowed(&self) -> &AllowSet<T> {
        &self.inner.allowed
    }

    pub fn policy(&self) -> DenialPolicy {
        self.inner.policy
    }

    /// Runs every checkpoint against the request headers and returns the
    /// admitted role.
    pub fn authorize(&self, headers: &HeaderMap) -> AuthResult<T> {
        let token = extract_bearer(headers)?;
        let claims = self.inner.codec.verify(token)?;
        let role = self.inner.extractor.project(&claims)?;
        if !self.inner.allowed.allows(&role) {
            return Err(AuthError::AccessDenied(
                role.to_string().chars().take(MAX_REPORTED_ROLE_LEN).collect(),
            ));
        }
        Ok(role)
    }

    /// Maps a failed checkpoint to the response the caller sees.
    pub fn denial_for(&self, err: &AuthError) -> Denial {
        match (err, self.inner.policy) {
            (AuthError::AccessDenied(_), DenialPolicy::Forbidden) => Denial::forbidden(err.to_string()),
            (AuthError::AccessDenied(_), DenialPolicy::BadRequest) => {
                Denial::invalid_request(err.to_string())
            }
            _ => Denial::from(err.clone()),
        }
    }

    /// Guards every route already registered on `router`. Unmatched paths keep
    /// their 404.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self.clone(), enforce::<T>))
    }
}

/// Middleware body; on success the admitted role is stored as [`GrantedRole`]
/// in the request extensions.
pub async fn enforce<T: RoleValue>(
    State(gate): State<RoleGate<T>>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()) {
        Ok(role) => {
            debug!(role = %role, path = %request.uri().path(), "request authorized");
            request.extensions_mut().insert(GrantedRole(role));
            next.run(request).await
        }
        Err(err) => {
            if err.is_configuration() {
                error!(error = %err, "authorization gate misconfigured");
            } else {
                warn!(error = %err, path = %request.uri().path(), "request denied");
            }
            gate.denial_for(&err).into_response()
        }
    }
}
