//! Permission requirements used at call sites

use crate::catalog::PermissionKey;
use crate::errors::{AccessError, Result};
use std::fmt;

/// What a guarded region needs
///
/// `AnyOf` is the call-site form (grant if ANY key matches). `AllOf` is how
/// nested guards compose: every member must pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Key(PermissionKey),
    AnyOf(Vec<PermissionKey>),
    AllOf(Vec<Requirement>),
}

impl Requirement {
    pub fn key(raw: &str) -> Result<Self> {
        Ok(Requirement::Key(PermissionKey::new(raw)?))
    }

    pub fn any_of<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| PermissionKey::new(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Requirement::AnyOf(keys))
    }

    pub fn all_of(requirements: Vec<Requirement>) -> Self {
        Requirement::AllOf(requirements)
    }

    /// Conjunction, flattening nested `AllOf`
    pub fn and(self, other: Requirement) -> Requirement {
        let mut parts = match self {
            Requirement::AllOf(parts) => parts,
            single => vec![single],
        };
        match other {
            Requirement::AllOf(more) => parts.extend(more),
            single => parts.push(single),
        }
        Requirement::AllOf(parts)
    }

    /// Every key mentioned anywhere in the requirement
    pub fn keys(&self) -> Vec<&PermissionKey> {
        match self {
            Requirement::Key(k) => vec![k],
            Requirement::AnyOf(keys) => keys.iter().collect(),
            Requirement::AllOf(parts) => parts.iter().flat_map(|p| p.keys()).collect(),
        }
    }
}

impl From<PermissionKey> for Requirement {
    fn from(key: PermissionKey) -> Self {
        Requirement::Key(key)
    }
}

impl std::str::FromStr for Requirement {
    type Err = AccessError;

    /// `a|b` is any-of, `a,b` is all-of, `a,b|c` is `a AND (b OR c)`
    fn from_str(s: &str) -> Result<Self> {
        let clauses: Vec<&str> = s.split(',').map(str::trim).collect();
        if clauses.iter().any(|c| c.is_empty()) {
            return Err(AccessError::ValidationError(format!("empty clause in requirement '{}'", s)));
        }

        let mut parsed = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let alternatives: Vec<&str> = clause.split('|').map(str::trim).collect();
            if alternatives.len() == 1 {
                parsed.push(Requirement::key(alternatives[0])?);
            } else {
                parsed.push(Requirement::any_of(alternatives)?);
            }
        }

        Ok(if parsed.len() == 1 {
            parsed.remove(0)
        } else {
            Requirement::AllOf(parsed)
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Key(k) => write!(f, "{}", k),
            Requirement::AnyOf(keys) => {
                let joined: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                write!(f, "any({})", joined.join(" | "))
            }
            Requirement::AllOf(parts) => {
                let joined: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "all({})", joined.join(", "))
            }
        }
    }
}
