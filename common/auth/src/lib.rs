pub mod access;
pub mod bearer;
pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod projector;
pub mod roles;
pub mod secret;

pub use access::{allowed, AllowSet};
pub use bearer::{extract_bearer, BEARER_PREFIX};
pub use claims::Claims;
pub use codec::TokenCodec;
pub use config::{DenialPolicy, GateConfig};
pub use error::{AuthError, AuthResult};
pub use extractors::GrantedRole;
pub use gate::{enforce, RoleGate};
pub use gate_http_errors::Denial;
pub use projector::{FieldRole, RoleExtractor, SubjectRole, DEFAULT_ROLE_FIELD};
pub use roles::{canonicalize, CanonicalRole, RoleValue};
pub use secret::{EnvSecret, Secret, SecretProvider, SecretSource, StaticSecret, DEFAULT_SECRET_ENV};
