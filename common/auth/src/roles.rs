use std::fmt;
use std::hash::Hash;

use serde_json::Value;

/// A role or permission value that can be read out of a claim.
///
/// `from_claim` is a strict type match: a JSON `"1"` is never an `i64` and a
/// JSON `1` is never a `String`.
pub trait RoleValue: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static {
    fn from_claim(value: &Value) -> Option<Self>;
}

impl RoleValue for String {
    fn from_claim(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl RoleValue for i64 {
    fn from_claim(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl RoleValue for u64 {
    fn from_claim(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

impl RoleValue for bool {
    fn from_claim(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

/// Role compared through its canonical string form, so numbers and strings with
/// the same rendering match. Opt-in; see [`canonicalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalRole(String);

impl CanonicalRole {
    pub fn of(value: impl Into<Value>) -> Self {
        Self(canonicalize(&value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl RoleValue for CanonicalRole {
    fn from_claim(value: &Value) -> Option<Self> {
        Some(Self(canonicalize(value)))
    }
}

/// Total rendering of a claim value to the string used for canonical matching.
///
/// - integers: base 10, no separators
/// - floats: shortest round-trip decimal, never an exponent; an integral float
///   renders like the integer (`1.0` -> `"1"`)
/// - strings: as-is
/// - booleans: `true` / `false`; null: `null`
/// - arrays and objects: compact JSON
pub fn canonicalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else if let Some(f) = n.as_f64() {
                f.to_string()
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
