use axum::{http::{HeaderValue, StatusCode}, response::{IntoResponse, Response}, Json};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

/// JSON body written for every denied request.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: u16,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")] pub error: Option<String>,
}

/// Outcome of a refused request. Rendering is left to `IntoResponse`, so callers
/// can inspect or log a denial before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Unauthorized { message: Option<String> },
    Forbidden { message: Option<String> },
    InvalidRequest { message: Option<String> },
}

impl Denial {
    pub fn unauthorized(message: impl Into<String>) -> Self { Self::Unauthorized { message: Some(message.into()) } }
    pub fn forbidden(message: impl Into<String>) -> Self { Self::Forbidden { message: Some(message.into()) } }
    pub fn invalid_request(message: impl Into<String>) -> Self { Self::InvalidRequest { message: Some(message.into()) } }

    pub fn status(&self) -> StatusCode {
        match self {
            Denial::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Denial::Forbidden { .. } => StatusCode::FORBIDDEN,
            Denial::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// User-level status label carried in the body.
    pub fn label(&self) -> &'static str {
        match self {
            Denial::Unauthorized { .. } => "Unauthorized request",
            Denial::Forbidden { .. } => "Forbidden",
            Denial::InvalidRequest { .. } => "Invalid request",
        }
    }

    /// Stable machine-readable code, sent as `X-Error-Code`.
    pub fn error_code(&self) -> &'static str {
        match self {
            Denial::Unauthorized { .. } => "unauthorized",
            Denial::Forbidden { .. } => "forbidden",
            Denial::InvalidRequest { .. } => "invalid_request",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Denial::Unauthorized { message } | Denial::Forbidden { message } | Denial::InvalidRequest { message } => message.as_deref(),
        }
    }

    fn into_parts(self) -> (StatusCode, &'static str, ErrorBody) {
        let status = self.status();
        let code = self.error_code();
        let label = self.label();
        let error = match self {
            Denial::Unauthorized { message } | Denial::Forbidden { message } | Denial::InvalidRequest { message } => message,
        };
        (status, code, ErrorBody { code: status.as_u16(), status: label, error })
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let (status, error_code, body) = self.into_parts();
        record_denial(status, error_code);
        let mut resp = (status, Json(body)).into_response();
        resp.headers_mut().insert("X-Error-Code", HeaderValue::from_static(error_code));
        resp
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static DENIALS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("gate_denials_total", "Requests refused by the authorization gate"),
        &["status", "code"],
    )
    .expect("static metric definition is valid");
    if let Err(err) = REGISTRY.register(Box::new(counter.clone())) {
        tracing::warn!(error = %err, "failed to register gate_denials_total");
    }
    counter
});

fn record_denial(status: StatusCode, code: &str) {
    DENIALS_TOTAL.with_label_values(&[status.as_str(), code]).inc();
}

/// Current value of the denial counter for a status/code pair.
pub fn denial_count(status: StatusCode, code: &str) -> u64 {
    DENIALS_TOTAL.with_label_values(&[status.as_str(), code]).get()
}

/// Prometheus text exposition of every metric registered by this crate.
pub fn render_metrics() -> String {
    Lazy::force(&DENIALS_TOTAL);
    let mut buffer = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %err, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
