use std::env;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, error};

use crate::error::{AuthError, AuthResult};

/// Environment variable consulted by [`SecretProvider::from_env`].
pub const DEFAULT_SECRET_ENV: &str = "SECRET_KEY";

/// Symmetric key material shared by signing and verification.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Arc<[u8]>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Where the signing secret comes from. Consulted at most once per provider.
pub trait SecretSource: Send + Sync {
    fn lookup(&self) -> Option<Vec<u8>>;

    /// Short label used in configuration errors; must not contain the secret.
    fn describe(&self) -> String;
}

/// Reads the secret from a process environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SecretSource for EnvSecret {
    fn lookup(&self) -> Option<Vec<u8>> {
        env::var(&self.var).ok().map(String::into_bytes)
    }

    fn describe(&self) -> String {
        format!("environment variable {} is not set", self.var)
    }
}

/// Fixed in-memory secret, for embedding hosts and tests.
#[derive(Clone)]
pub struct StaticSecret(Vec<u8>);

impl StaticSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

impl SecretSource for StaticSecret {
    fn lookup(&self) -> Option<Vec<u8>> {
        Some(self.0.clone())
    }

    fn describe(&self) -> String {
        "static secret is empty".to_string()
    }
}

/// Resolves the secret from its source on first use and caches the outcome.
///
/// Both success and failure are cached: the source is consulted exactly once,
/// even when the first resolutions race on several threads.
pub struct SecretProvider {
    source: Box<dyn SecretSource>,
    resolved: OnceCell<AuthResult<Secret>>,
}

static GLOBAL: Lazy<Arc<SecretProvider>> = Lazy::new(|| Arc::new(SecretProvider::from_env()));

impl SecretProvider {
    pub fn with_source(source: impl SecretSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            resolved: OnceCell::new(),
        }
    }

    /// Provider backed by `SECRET_KEY`.
    pub fn from_env() -> Self {
        Self::from_env_var(DEFAULT_SECRET_ENV)
    }

    pub fn from_env_var(var: impl Into<String>) -> Self {
        Self::with_source(EnvSecret::new(var))
    }

    pub fn from_static(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_source(StaticSecret::new(bytes))
    }

    /// Process-wide provider reading `SECRET_KEY`. Every caller shares one
    /// cache, so the variable is read at most once per process.
    pub fn global() -> Arc<SecretProvider> {
        GLOBAL.clone()
    }

    pub fn resolve(&self) -> AuthResult<Secret> {
        self.resolved
            .get_or_init(|| match self.source.lookup() {
                Some(bytes) if !bytes.is_empty() => {
                    debug!("signing secret resolved");
                    Ok(Secret::new(bytes))
                }
                _ => {
                    let reason = self.source.describe();
                    error!(%reason, "signing secret unavailable; every token operation will fail");
                    Err(AuthError::Configuration(reason))
                }
            })
            .clone()
    }
}

impl fmt::Debug for SecretProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretProvider")
            .field("resolved", &self.resolved.get().map(|r| r.is_ok()))
            .finish()
    }
}
