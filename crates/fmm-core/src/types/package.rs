//! Package types.
//!
//! A package is every known release of one mod plus which of them, if any, is enabled.

use super::{Release, Version, VersionReq};

/// All known releases of a mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    /// Ascending by version, no duplicates
    releases: Vec<Release>,
    /// Always the version of one of `releases`
    enabled: Option<Version>,
}

impl Package {
    /// Create a package from its first release
    pub fn new(release: Release) -> Self {
        Self {
            name: release.name.clone(),
            releases: vec![release],
            enabled: None,
        }
    }

    /// Releases in ascending version order
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    /// Newest release
    pub fn latest_release(&self) -> Option<&Release> {
        self.releases.last()
    }

    /// Exact release when a version is given, newest otherwise
    pub fn get_release(&self, version: Option<&Version>) -> Option<&Release> {
        match version {
            Some(version) => self
                .releases
                .binary_search_by(|r| r.version.cmp(version))
                .ok()
                .map(|idx| &self.releases[idx]),
            None => self.latest_release(),
        }
    }

    /// Newest release satisfying the requirement
    pub fn matching_release(&self, req: &VersionReq) -> Option<&Release> {
        self.releases.iter().rev().find(|r| req.matches(&r.version))
    }

    /// Version of the enabled release, if any
    pub fn enabled(&self) -> Option<Version> {
        self.enabled
    }

    /// Currently enabled release
    pub fn enabled_release(&self) -> Option<&Release> {
        self.enabled.as_ref().and_then(|v| self.get_release(Some(v)))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.is_some()
    }

    /// Enable the release with exactly this version
    ///
    /// Returns `false` and changes nothing when no such release exists.
    pub fn set_enabled(&mut self, version: Version) -> bool {
        if self.get_release(Some(&version)).is_none() {
            return false;
        }
        self.enabled = Some(version);
        true
    }

    /// Clear the enabled release, returning the version that was enabled
    pub fn disable(&mut self) -> Option<Version> {
        self.enabled.take()
    }

    /// Remove the release with exactly this version
    ///
    /// Disables the package when that release was the enabled one.
    pub fn remove_release(&mut self, version: &Version) -> Option<Release> {
        let idx = self
            .releases
            .binary_search_by(|r| r.version.cmp(version))
            .ok()?;

        if self.enabled.as_ref() == Some(version) {
            self.enabled = None;
        }
        Some(self.releases.remove(idx))
    }

    /// Insert a release keeping versions ascending
    ///
    /// Returns `false` and leaves the package untouched when a release with the
    /// same version is already present.
    pub fn insert_release(&mut self, release: Release) -> bool {
        debug_assert_eq!(release.name, self.name);

        match self
            .releases
            .binary_search_by(|r| r.version.cmp(&release.version))
        {
            Ok(_) => false,
            Err(idx) => {
                self.releases.insert(idx, release);
                true
            },
        }
    }
}
