use std::collections::HashSet;

use serde_json::Value;

use crate::roles::{CanonicalRole, RoleValue};

/// Roles a gate lets through. Built once, read-only afterwards.
///
/// An empty set admits nobody.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowSet<T: RoleValue> {
    members: HashSet<T>,
}

impl<T: RoleValue> AllowSet<T> {
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, candidate: &T) -> bool {
        self.members.contains(candidate)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in sorted display order, for logs and error bodies.
    pub fn describe(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.iter().map(ToString::to_string).collect();
        names.sort();
        names
    }
}

impl AllowSet<CanonicalRole> {
    /// Builds a set from heterogeneous values, canonicalising each member.
    pub fn canonical<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            members: values.into_iter().map(CanonicalRole::of).collect(),
        }
    }
}

impl<T: RoleValue> FromIterator<T> for AllowSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Exact membership test of `candidate` in `allow`.
pub fn allowed<T: RoleValue>(candidate: &T, allow: &AllowSet<T>) -> bool {
    allow.allows(candidate)
}
