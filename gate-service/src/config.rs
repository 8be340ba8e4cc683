use anyhow::{anyhow, Context, Result};
use gate_auth::{DenialPolicy, GateConfig, DEFAULT_SECRET_ENV};
use std::collections::BTreeSet;
use std::env;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    /// Name of the environment variable holding the signing secret.
    pub secret_env: String,
    pub gate: GateConfig,
    pub admin_roles: BTreeSet<String>,
    pub editor_roles: BTreeSet<String>,
    /// Exposes `POST /tokens`. Never enable outside development.
    pub dev_issuer: bool,
    pub token_ttl_seconds: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
            secret_env: DEFAULT_SECRET_ENV.to_string(),
            gate: GateConfig::default(),
            admin_roles: default_admin_roles(),
            editor_roles: default_editor_roles(),
            dev_issuer: false,
            token_ttl_seconds: 900,
        }
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let defaults = ServiceConfig::default();

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid HOST '{host}'"))?;
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.addr.port());

    let secret_env = env::var("GATE_SECRET_ENV")
        .ok()
        .and_then(|value| normalize_optional(&value))
        .unwrap_or(defaults.secret_env);

    let mut gate = GateConfig::default();
    if let Some(field) = env::var("GATE_ROLE_FIELD")
        .ok()
        .and_then(|value| normalize_optional(&value))
    {
        gate = gate.with_role_field(field);
    }
    if let Ok(value) = env::var("GATE_DENIAL_POLICY") {
        let policy = value
            .parse::<DenialPolicy>()
            .map_err(|err| anyhow!(err))
            .context("Failed to parse GATE_DENIAL_POLICY")?;
        gate = gate.with_denial_policy(policy);
    }

    let admin_roles = env::var("GATE_ADMIN_ROLES")
        .ok()
        .map(|value| parse_roles(&value))
        .unwrap_or(defaults.admin_roles);
    let editor_roles = env::var("GATE_EDITOR_ROLES")
        .ok()
        .map(|value| parse_roles(&value))
        .unwrap_or(defaults.editor_roles);

    let dev_issuer = bool_from_env("GATE_DEV_ISSUER").unwrap_or(false);

    let token_ttl_seconds = match env::var("GATE_TOKEN_TTL_SECS") {
        Ok(value) => value
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Invalid GATE_TOKEN_TTL_SECS '{value}'"))?,
        Err(_) => defaults.token_ttl_seconds,
    };

    Ok(ServiceConfig {
        addr: SocketAddr::from((ip, port)),
        secret_env,
        gate,
        admin_roles,
        editor_roles,
        dev_issuer,
        token_ttl_seconds,
    })
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// Splits on commas, semicolons and spaces. Case is preserved: role matching is exact.
fn parse_roles(value: &str) -> BTreeSet<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn default_admin_roles() -> BTreeSet<String> {
    BTreeSet::from(["admin".to_string()])
}

fn default_editor_roles() -> BTreeSet<String> {
    BTreeSet::from(["admin".to_string(), "editor".to_string()])
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
