//! Dependency specification types.
//!
//! Defines mod dependencies as declared in `info.json`, e.g. `"? bobores >= 0.18.0"`.

use super::{ModIdent, Op, Version, VersionReq};
use crate::error::FmmError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Dependency specification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub name: String,
    pub version_req: VersionReq,
    pub kind: DependencyKind,
}

/// Type of dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Must be present and enabled
    Required,
    /// Loaded first when present (`?`)
    Optional,
    /// Optional and not shown in the game's mod list (`(?)`)
    HiddenOptional,
    /// Must not be enabled together (`!`)
    Incompatible,
    /// Required, but without load order constraints (`~`)
    NoLoadOrder,
}

impl Dependency {
    /// Create a new required dependency
    pub fn new(name: impl Into<String>, version_req: VersionReq) -> Self {
        Self {
            name: name.into(),
            version_req,
            kind: DependencyKind::Required,
        }
    }

    /// Check if the given version satisfies this dependency's constraint
    pub fn matches(&self, version: &Version) -> bool {
        self.version_req.matches(version)
    }
}

impl DependencyKind {
    /// Check if the resolver follows this dependency
    pub fn is_expanded(&self) -> bool {
        match self {
            DependencyKind::Required | DependencyKind::NoLoadOrder => true,
            DependencyKind::Optional
            | DependencyKind::HiddenOptional
            | DependencyKind::Incompatible => false,
        }
    }

    /// Leading marker in the dependency string, empty for required
    pub fn marker(&self) -> &'static str {
        match self {
            DependencyKind::Required => "",
            DependencyKind::Optional => "?",
            DependencyKind::HiddenOptional => "(?)",
            DependencyKind::Incompatible => "!",
            DependencyKind::NoLoadOrder => "~",
        }
    }

    fn strip_marker(input: &str) -> (DependencyKind, &str) {
        // "(?)" before "?" so the hidden marker is not read as optional
        const MARKERS: [(&str, DependencyKind); 4] = [
            ("(?)", DependencyKind::HiddenOptional),
            ("?", DependencyKind::Optional),
            ("!", DependencyKind::Incompatible),
            ("~", DependencyKind::NoLoadOrder),
        ];

        MARKERS
            .iter()
            .find_map(|(marker, kind)| input.strip_prefix(marker).map(|rest| (*kind, rest)))
            .unwrap_or((DependencyKind::Required, input))
    }
}

impl FromStr for Dependency {
    type Err = FmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| FmmError::InvalidDependency {
            input: s.to_string(),
            reason,
        };

        let (kind, rest) = DependencyKind::strip_marker(s.trim());

        let (name, constraint) = match rest.find(['<', '>', '=']) {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("missing mod name".to_string()));
        }

        let constraint = constraint.trim();
        let version_req = if constraint.is_empty() {
            VersionReq::Any
        } else {
            let (op, version) = Op::strip_prefix(constraint)
                .ok_or_else(|| invalid(format!("unknown operator in '{}'", constraint)))?;
            let version = Version::from_str(version).map_err(|e| invalid(e.to_string()))?;
            VersionReq::Compare { op, version }
        };

        Ok(Dependency {
            name: name.to_string(),
            version_req,
            kind,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = self.kind.marker();
        if !marker.is_empty() {
            write!(f, "{} ", marker)?;
        }

        f.write_str(&self.name)?;

        if let VersionReq::Compare { op, version } = &self.version_req {
            write!(f, " {} {}", op, version)?;
        }

        Ok(())
    }
}

impl From<&ModIdent> for Dependency {
    fn from(ident: &ModIdent) -> Self {
        let version_req = ident.version.map(VersionReq::exact).unwrap_or_default();
        Dependency::new(ident.name.clone(), version_req)
    }
}

impl Serialize for Dependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
