//! Mod version types.
//!
//! Provides Version and VersionReq types for the dotted numeric versions used by
//! mods (`major.minor.patch`, optionally followed by a fourth build component).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Mod version (major.minor.patch[.build])
///
/// Ordering, equality and hashing all work on the zero-extended tuple, so
/// `1.2` and `1.2.0.0` are the same version.
#[derive(Debug, Clone, Copy)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub build: Option<u64>,
}

/// Version constraint attached to a dependency (`>= 1.1.0`, `= 2.0.0`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VersionReq {
    /// No constraint, every version satisfies it
    #[default]
    Any,
    /// Comparison against a single version
    Compare { op: Op, version: Version },
}

/// Comparison operator for version requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exact,     // = 1.0.0
    Greater,   // > 1.0.0
    GreaterEq, // >= 1.0.0
    Less,      // < 1.0.0
    LessEq,    // <= 1.0.0
}

/// Version parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format '{input}': {reason}")]
    InvalidFormat { input: String, reason: String },

    #[error("Invalid version requirement '{input}'")]
    InvalidRequirement { input: String },
}

impl Version {
    /// Create a new three-component version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build: None,
        }
    }

    /// Create a four-component version
    pub fn with_build(major: u64, minor: u64, patch: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build: Some(build),
        }
    }

    /// Check if this version satisfies a version requirement
    pub fn satisfies(&self, req: &VersionReq) -> bool {
        req.matches(self)
    }

    fn key(&self) -> (u64, u64, u64, u64) {
        (self.major, self.minor, self.patch, self.build.unwrap_or(0))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: &str| VersionError::InvalidFormat {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("empty version"));
        }

        let mut parts = [0u64; 4];
        let mut count = 0;
        for segment in input.split('.') {
            if count == parts.len() {
                return Err(invalid("more than four components"));
            }
            if segment.is_empty() {
                return Err(invalid("empty component"));
            }
            // u64::from_str would accept a leading '+'
            if !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("non-numeric component"));
            }
            parts[count] = segment
                .parse()
                .map_err(|_| invalid("component out of range"))?;
            count += 1;
        }

        Ok(Version {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            build: (count == 4).then_some(parts[3]),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
        }

        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl Op {
    /// Textual form used in dependency strings
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Exact => "=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
        }
    }

    /// Split a leading operator off `input`, longest match first
    pub fn strip_prefix(input: &str) -> Option<(Op, &str)> {
        const OPS: [(&str, Op); 5] = [
            (">=", Op::GreaterEq),
            ("<=", Op::LessEq),
            (">", Op::Greater),
            ("<", Op::Less),
            ("=", Op::Exact),
        ];

        OPS.iter()
            .find_map(|(text, op)| input.strip_prefix(text).map(|rest| (*op, rest)))
    }

    fn test(&self, candidate: &Version, version: &Version) -> bool {
        match self {
            Op::Exact => candidate == version,
            Op::Greater => candidate > version,
            Op::GreaterEq => candidate >= version,
            Op::Less => candidate < version,
            Op::LessEq => candidate <= version,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VersionReq {
    /// Requirement that only the given version satisfies
    pub fn exact(version: Version) -> Self {
        VersionReq::Compare {
            op: Op::Exact,
            version,
        }
    }

    /// Parse a version requirement string
    ///
    /// An empty string means no constraint; a bare version means `=`.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let input = input.trim();

        if input.is_empty() || input == "*" {
            return Ok(VersionReq::Any);
        }

        let (op, version_str) = Op::strip_prefix(input).unwrap_or((Op::Exact, input));
        let version = Version::from_str(version_str).map_err(|_| {
            VersionError::InvalidRequirement {
                input: input.to_string(),
            }
        })?;

        Ok(VersionReq::Compare { op, version })
    }

    /// Check if a version matches this requirement
    pub fn matches(&self, candidate: &Version) -> bool {
        match self {
            VersionReq::Any => true,
            VersionReq::Compare { op, version } => op.test(candidate, version),
        }
    }

    /// Check whether this is the unconstrained requirement
    pub fn is_any(&self) -> bool {
        matches!(self, VersionReq::Any)
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionReq::Any => f.write_str("*"),
            VersionReq::Compare { op, version } => write!(f, "{} {}", op, version),
        }
    }
}
