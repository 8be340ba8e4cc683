use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

pub const EXPIRY_CLAIM: &str = "exp";
pub const SUBJECT_CLAIM: &str = "sub";

/// Verified token payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claims {
    raw: Map<String, Value>,
}

impl Claims {
    /// Wraps a decoded payload, requiring an integral `exp`.
    pub fn from_map(raw: Map<String, Value>) -> AuthResult<Self> {
        match raw.get(EXPIRY_CLAIM) {
            Some(exp) if exp.is_i64() || exp.is_u64() => Ok(Self { raw }),
            Some(_) => Err(AuthError::MalformedToken("exp claim is not an integer")),
            None => Err(AuthError::MalformedToken("exp claim missing")),
        }
    }

    /// Expiry as Unix seconds. Values beyond `i64::MAX` saturate.
    pub fn expires_at(&self) -> i64 {
        self.raw
            .get(EXPIRY_CLAIM)
            .and_then(|exp| exp.as_i64().or_else(|| exp.as_u64().map(|_| i64::MAX)))
            .unwrap_or(i64::MIN)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires_at(), 0).single()
    }

    /// The flat `sub` claim, if any.
    pub fn subject(&self) -> Option<&Value> {
        self.raw.get(SUBJECT_CLAIM)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

}

/// Builds the signed payload: an object subject contributes its fields at the top
/// level, `null` contributes nothing, any other subject becomes `sub`. `exp`
/// always overrides the subject.
pub(crate) fn issue_payload(subject: Value, exp: i64) -> Map<String, Value> {
    let mut payload = match subject {
        Value::Object(fields) => fields,
        Value::Null => Map::new(),
        flat => {
            let mut map = Map::new();
            map.insert(SUBJECT_CLAIM.to_string(), flat);
            map
        }
    };
    payload.insert(EXPIRY_CLAIM.to_string(), Value::from(exp));
    payload
}
