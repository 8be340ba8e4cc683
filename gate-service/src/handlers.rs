use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Duration;
use gate_auth::{GrantedRole, TokenCodec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::ServiceConfig;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics() -> Response {
    let mut resp = gate_http_errors::render_metrics().into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    resp
}

pub async fn admin_area(GrantedRole(role): GrantedRole<String>) -> Json<Value> {
    Json(json!({ "area": "admin", "role": role }))
}

pub async fn reports(GrantedRole(role): GrantedRole<String>) -> Json<Value> {
    Json(json!({ "area": "reports", "role": role }))
}

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub subject: Value,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Development-only issuance: signs whatever subject the caller sends.
pub async fn issue_token(
    State(codec): State<TokenCodec>,
    State(config): State<Arc<ServiceConfig>>,
    Json(payload): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, (StatusCode, String)> {
    let ttl = payload.ttl_seconds.unwrap_or(config.token_ttl_seconds);
    let lifetime = Duration::try_seconds(ttl)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "ttl_seconds out of range".to_string()))?;
    let access_token = codec
        .sign(&payload.subject, lifetime)
        .map_err(|err| {
            error!(error = %err, "failed to issue token");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;
    info!(ttl_seconds = ttl, "issued development token");

    Ok(Json(IssueTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ttl,
    }))
}
