use std::marker::PhantomData;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::roles::RoleValue;

pub const DEFAULT_ROLE_FIELD: &str = "role";

/// Pulls the role or permission a gate decides on out of verified claims.
pub trait RoleExtractor<T: RoleValue>: Send + Sync {
    fn project(&self, claims: &Claims) -> AuthResult<T>;
}

/// The subject is a flat value stored in `sub`.
#[derive(Debug, Clone, Copy)]
pub struct SubjectRole<T>(PhantomData<fn() -> T>);

impl<T> SubjectRole<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SubjectRole<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RoleValue> RoleExtractor<T> for SubjectRole<T> {
    fn project(&self, claims: &Claims) -> AuthResult<T> {
        claims
            .subject()
            .and_then(T::from_claim)
            .ok_or(AuthError::MissingSubjectClaim)
    }
}

/// The subject is a mapping and the role lives under a named field.
#[derive(Debug, Clone)]
pub struct FieldRole<T> {
    field: String,
    _role: PhantomData<fn() -> T>,
}

impl<T> FieldRole<T> {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            _role: PhantomData,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl<T> Default for FieldRole<T> {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_FIELD)
    }
}

impl<T: RoleValue> RoleExtractor<T> for FieldRole<T> {
    fn project(&self, claims: &Claims) -> AuthResult<T> {
        let value = claims
            .get(&self.field)
            .ok_or(AuthError::MissingSubjectClaim)?;
        T::from_claim(value).ok_or_else(|| AuthError::InvalidRoleClaim(self.field.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::CanonicalRole;
    use serde_json::{json, Value};

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => Claims::from_map(map).expect("claims"),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn field_role_reads_default_field() {
        let claims = claims(json!({"role": "admin", "exp": 10}));
        let role = FieldRole::<String>::default().project(&claims).unwrap();
        assert_eq!(role, "admin");
    }

    #[test]
    fn field_role_uses_configured_field() {
        let claims = claims(json!({"permission": 7, "role": "ignored", "exp": 10}));
        let extractor = FieldRole::<i64>::new("permission");
        assert_eq!(extractor.project(&claims).unwrap(), 7);
    }

    #[test]
    fn field_role_missing_field() {
        let claims = claims(json!({"exp": 10}));
        let err = FieldRole::<String>::default().project(&claims).unwrap_err();
        assert_eq!(err, AuthError::MissingSubjectClaim);
    }

    #[test]
    fn field_role_rejects_wrong_type() {
        let numeric = claims(json!({"role": 1, "exp": 10}));
        let err = FieldRole::<String>::default().project(&numeric).unwrap_err();
        assert_eq!(err, AuthError::InvalidRoleClaim("role".to_string()));

        let textual = claims(json!({"role": "1", "exp": 10}));
        let err = FieldRole::<i64>::default().project(&textual).unwrap_err();
        assert_eq!(err, AuthError::InvalidRoleClaim("role".to_string()));
    }

    #[test]
    fn field_role_canonical_accepts_any_shape() {
        let claims = claims(json!({"role": 1, "exp": 10}));
        let role = FieldRole::<CanonicalRole>::default().project(&claims).unwrap();
        assert_eq!(role.as_str(), "1");
    }

    #[test]
    fn subject_role_reads_flat_sub() {
        let claims = claims(json!({"sub": "editor", "exp": 10}));
        let role = SubjectRole::<String>::new().project(&claims).unwrap();
        assert_eq!(role, "editor");
    }

    #[test]
    fn subject_role_rejects_absent_or_mistyped_sub() {
        let err = SubjectRole::<String>::new()
            .project(&claims(json!({"exp": 10})))
            .unwrap_err();
        assert_eq!(err, AuthError::MissingSubjectClaim);

        let err = SubjectRole::<String>::new()
            .project(&claims(json!({"sub": {"role": "admin"}, "exp": 10})))
            .unwrap_err();
        assert_eq!(err, AuthError::MissingSubjectClaim);

        let err = SubjectRole::<u64>::new()
            .project(&claims(json!({"sub": "3", "exp": 10})))
            .unwrap_err();
        assert_eq!(err, AuthError::MissingSubjectClaim);
    }
}
