//! Mod identity: a name with an optional pinned version.

use super::Version;
use crate::error::FmmError;
use std::fmt;
use std::str::FromStr;

/// Mod name plus an optional exact version (`name` or `name@version`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModIdent {
    pub name: String,
    pub version: Option<Version>,
}

impl ModIdent {
    /// Identity without a pinned version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Identity pinned to an exact version
    pub fn with_version(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
        }
    }
}

impl FromStr for ModIdent {
    type Err = FmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| FmmError::InvalidIdent {
            input: s.to_string(),
            reason,
        };

        let mut parts = s.trim().split('@');
        let name = parts.next().unwrap_or_default().trim();
        let version = parts.next();

        if parts.next().is_some() {
            return Err(invalid("more than one '@'".to_string()));
        }
        if name.is_empty() {
            return Err(invalid("missing mod name".to_string()));
        }

        let version = version
            .map(|v| Version::from_str(v).map_err(|e| invalid(e.to_string())))
            .transpose()?;

        Ok(ModIdent {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ModIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}
