use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::routing::{get, post};
use axum::Router;
use gate_auth::{AllowSet, RoleGate, SecretProvider, TokenCodec, DEFAULT_SECRET_ENV};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::config::ServiceConfig;
use crate::handlers::{admin_area, health, issue_token, metrics, reports};

#[derive(Clone)]
pub struct AppState {
    pub codec: TokenCodec,
    pub config: Arc<ServiceConfig>,
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(state: &AppState) -> Self {
        state.codec.clone()
    }
}

impl FromRef<AppState> for Arc<ServiceConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl AppState {
    /// State whose codec reads the secret from `config.secret_env` on first use.
    /// The default variable goes through the process-wide provider.
    pub fn from_config(config: ServiceConfig) -> Self {
        let secrets = if config.secret_env == DEFAULT_SECRET_ENV {
            SecretProvider::global()
        } else {
            Arc::new(SecretProvider::from_env_var(config.secret_env.clone()))
        };
        Self::with_secrets(config, secrets)
    }

    pub fn with_secrets(config: ServiceConfig, secrets: Arc<SecretProvider>) -> Self {
        Self {
            codec: TokenCodec::new(secrets),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let admin_gate = RoleGate::<String>::field(
        &config.gate,
        state.codec.clone(),
        AllowSet::new(config.admin_roles.iter().cloned()),
    );
    let editor_gate = RoleGate::<String>::field(
        &config.gate,
        state.codec.clone(),
        AllowSet::new(config.editor_roles.iter().cloned()),
    );
    info!(
        admin = ?admin_gate.allowed().describe(),
        editor = ?editor_gate.allowed().describe(),
        policy = %config.gate.denial_policy,
        role_field = %config.gate.role_field,
        "authorization gates configured"
    );

    let admin = admin_gate.apply(Router::new().route("/admin", get(admin_area)));
    let editor = editor_gate.apply(Router::new().route("/reports", get(reports)));

    let mut app = Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .merge(admin)
        .merge(editor);

    if config.dev_issuer {
        info!("development token issuer enabled at POST /tokens");
        app = app.route("/tokens", post(issue_token));
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    app.with_state(state).layer(cors)
}
