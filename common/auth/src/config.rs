use std::fmt;
use std::str::FromStr;

use crate::projector::DEFAULT_ROLE_FIELD;

/// Status used when a verified caller holds a role outside the allow set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DenialPolicy {
    /// 403 Forbidden.
    #[default]
    Forbidden,
    /// 400 Invalid request.
    BadRequest,
}

impl FromStr for DenialPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forbidden" | "403" => Ok(DenialPolicy::Forbidden),
            "bad_request" | "bad-request" | "400" => Ok(DenialPolicy::BadRequest),
            other => Err(format!(
                "unsupported denial policy '{other}'. Use forbidden or bad_request."
            )),
        }
    }
}

impl fmt::Display for DenialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DenialPolicy::Forbidden => "forbidden",
            DenialPolicy::BadRequest => "bad_request",
        })
    }
}

/// Settings fixed at gate construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Claim holding the role when the subject is a mapping.
    pub role_field: String,
    pub denial_policy: DenialPolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            role_field: DEFAULT_ROLE_FIELD.to_string(),
            denial_policy: DenialPolicy::default(),
        }
    }
}

impl GateConfig {
    pub fn with_role_field(mut self, field: impl Into<String>) -> Self {
        self.role_field = field.into();
        self
    }

    pub fn with_denial_policy(mut self, policy: DenialPolicy) -> Self {
        self.denial_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GateConfig::default();
        assert_eq!(config.role_field, "role");
        assert_eq!(config.denial_policy, DenialPolicy::Forbidden);
    }

    #[test]
    fn denial_policy_parses() {
        assert_eq!("Forbidden".parse::<DenialPolicy>(), Ok(DenialPolicy::Forbidden));
        assert_eq!(" bad_request ".parse::<DenialPolicy>(), Ok(DenialPolicy::BadRequest));
        assert_eq!("400".parse::<DenialPolicy>(), Ok(DenialPolicy::BadRequest));
        assert!("teapot".parse::<DenialPolicy>().is_err());
    }
}
