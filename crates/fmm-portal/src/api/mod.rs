//! Mod portal API response types

use crate::PortalResult;
use fmm_core::{Dependency, FmmError, Release, Source, Version, VersionReq};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Response of `GET /api/mods/{name}/full`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModPortalResult {
    /// Mod name
    pub name: String,
    /// Display title
    pub title: Option<String>,
    /// Short description
    pub summary: Option<String>,
    /// Every published release
    #[serde(default)]
    pub releases: Vec<PortalRelease>,
}

/// One release as listed by the portal
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalRelease {
    /// Path of the download endpoint, relative to the portal root
    pub download_url: String,
    /// Archive file name (`{name}_{version}.zip`)
    pub file_name: String,
    /// Copy of the release's info.json
    #[serde(default)]
    pub info_json: PortalInfoJson,
    /// Publication timestamp
    pub released_at: Option<String>,
    /// sha1 of the archive
    pub sha1: Option<String>,
    pub version: Version,
}

/// The parts of a release's info.json the portal echoes back
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PortalInfoJson {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub factorio_version: Option<String>,
}

/// Envelope decoded before the releases, so one bad release cannot poison the rest
#[derive(Deserialize)]
struct RawModPortalResult {
    name: String,
    title: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    releases: Vec<serde_json::Value>,
}

impl ModPortalResult {
    /// Decode the body of `GET /api/mods/{name}/full`
    ///
    /// Releases whose version or dependencies do not parse are skipped with a
    /// warning. A body that is not a mod object at all is a `PortalResponse` error.
    pub fn from_slice(requested: &str, body: &[u8]) -> PortalResult<Self> {
        let RawModPortalResult {
            name,
            title,
            summary,
            releases,
        } = serde_json::from_slice(body).map_err(|e| FmmError::PortalResponse {
            name: requested.to_string(),
            message: e.to_string(),
        })?;

        let releases = releases
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<PortalRelease>(value) {
                Ok(release) => Some(release),
                Err(e) => {
                    warn!("Skipping unreadable release of '{}': {}", name, e);
                    None
                },
            })
            .collect();

        Ok(Self {
            name,
            title,
            summary,
            releases,
        })
    }

    /// Sort releases ascending by version
    pub fn sort_releases(&mut self) {
        self.releases.sort_by(|a, b| a.version.cmp(&b.version));
    }

    /// Newest release satisfying the requirement
    ///
    /// Expects releases in ascending order (see [`ModPortalResult::sort_releases`]).
    pub fn matching_release(&self, req: &VersionReq) -> Option<&PortalRelease> {
        self.releases.iter().rev().find(|r| req.matches(&r.version))
    }
}

impl PortalRelease {
    /// Convert into a registry release for the given mod
    pub fn to_release(&self, name: &str) -> Release {
        Release {
            name: name.to_string(),
            version: self.version,
            dependencies: self.info_json.dependencies.clone(),
            source: Source::Portal {
                download_url: self.download_url.clone(),
                file_name: self.file_name.clone(),
                sha1: self.sha1.clone(),
            },
        }
    }
}
