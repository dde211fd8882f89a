//! Release types.
//!
//! A release is one immutable, versioned artifact of a mod together with the
//! place it can be obtained from.

use super::{Dependency, DependencyKind, ModIdent, Version};
use std::path::{Path, PathBuf};

/// One published artifact of a mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<Dependency>,
    pub source: Source,
}

/// Where a release's files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Zip archive on disk (`{name}_{version}.zip`)
    Archive(PathBuf),
    /// Unpacked directory on disk (`{name}`)
    Directory(PathBuf),
    /// Release hosted on the mod portal
    Portal {
        download_url: String,
        file_name: String,
        sha1: Option<String>,
    },
}

impl Release {
    /// Identity pinned to this release's version
    pub fn ident(&self) -> ModIdent {
        ModIdent::with_version(self.name.clone(), self.version)
    }

    /// Canonical archive file name for this release
    pub fn archive_name(&self) -> String {
        archive_name(&self.name, &self.version)
    }

    /// Dependencies the resolver follows
    pub fn expanded_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| d.kind.is_expanded())
    }

    /// Dependencies that must not be enabled alongside this release
    pub fn incompatibilities(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::Incompatible)
    }

    /// Check whether the release is available on the local filesystem
    pub fn is_local(&self) -> bool {
        self.source.local_path().is_some()
    }
}

impl Source {
    /// Path on disk, if this source is local
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Source::Archive(path) | Source::Directory(path) => Some(path),
            Source::Portal { .. } => None,
        }
    }
}

/// Canonical archive file name: `{name}_{version}.zip`
pub fn archive_name(name: &str, version: &Version) -> String {
    format!("{}_{}.zip", name, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(deps: &[&str]) -> Release {
        Release {
            name: "a".to_string(),
            version: Version::new(1, 0, 0),
            dependencies: deps.iter().map(|d| d.parse().unwrap()).collect(),
            source: Source::Archive(PathBuf::from("mods/a_1.0.0.zip")),
        }
    }

    #[test]
    fn test_dependency_views() {
        let r = release(&["base >= 1.1", "b", "? c", "(?) d", "! e", "~ f"]);

        let expanded: Vec<_> = r.expanded_dependencies().map(|d| d.name.as_str()).collect();
        assert_eq!(expanded, vec!["base", "b", "f"]);

        let incompatible: Vec<_> = r.incompatibilities().map(|d| d.name.as_str()).collect();
        assert_eq!(incompatible, vec!["e"]);
    }

    #[test]
    fn test_archive_name_and_ident() {
        let r = release(&[]);
        assert_eq!(r.archive_name(), "a_1.0.0.zip");
        assert_eq!(r.ident().to_string(), "a@1.0.0");
        assert!(r.is_local());
    }
}
