//! Installed mods and their enabled state.
//!
//! The registry is built once per run from the game's internal data directory
//! and the user's mods directory. Loading is all-or-nothing: the first artifact
//! that fails to parse aborts the whole load.

use crate::archive::read_release;
use crate::mod_list::{ModListEntry, ModListJson, MOD_LIST_FILE};
use crate::RegistryResult;
use fmm_core::utils::is_hidden;
use fmm_core::{FmmError, ModIdent, Package, Release, Source, Version, VersionReq, BASE_PACKAGE};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files in the mods directory that are never releases
const NON_ARTIFACTS: [&str; 2] = [MOD_LIST_FILE, "mod-settings.dat"];

/// Registry behaviour knobs
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Always-present package, enabled when no `mod-list.json` exists
    pub base_package: String,
    /// Packages exempt from `disable_all`
    pub internal_packages: BTreeSet<String>,
    /// Write `mod-list.json` on `save` and delete artifacts on removal;
    /// `false` for dry runs
    pub save: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            base_package: BASE_PACKAGE.to_string(),
            internal_packages: BTreeSet::from([BASE_PACKAGE.to_string()]),
            save: true,
        }
    }
}

/// Directories scanned for releases
#[derive(Debug, Clone)]
pub struct PackageSources {
    /// Game-shipped packages (e.g. `{game_dir}/data`); missing directories are skipped
    pub internal: Vec<PathBuf>,
    /// The user's mods directory, which also holds `mod-list.json`
    pub user: PathBuf,
}

/// All known packages, keyed and iterated by name
#[derive(Debug)]
pub struct Registry {
    packages: BTreeMap<String, Package>,
    internal: BTreeSet<String>,
    mods_dir: PathBuf,
    options: RegistryOptions,
}

impl Registry {
    /// Create an empty registry rooted at a mods directory
    pub fn new(mods_dir: impl Into<PathBuf>, options: RegistryOptions) -> Self {
        Self {
            packages: BTreeMap::new(),
            internal: options.internal_packages.clone(),
            mods_dir: mods_dir.into(),
            options,
        }
    }

    /// Scan every source and build the registry
    pub fn load(sources: &PackageSources, options: RegistryOptions) -> RegistryResult<Self> {
        let mut registry = Self::new(&sources.user, options);

        for dir in &sources.internal {
            if !dir.is_dir() {
                debug!("Skipping missing internal source {}", dir.display());
                continue;
            }
            for name in registry.scan(dir)? {
                registry.internal.insert(name);
            }
        }

        registry.scan(&sources.user)?;

        info!(
            "Loaded {} packages from {}",
            registry.packages.len(),
            sources.user.display()
        );
        Ok(registry)
    }

    /// Load every artifact in `dir`, returning the names of the packages seen
    fn scan(&mut self, dir: &Path) -> RegistryResult<BTreeSet<String>> {
        let read_dir = std::fs::read_dir(dir)
            .map_err(|e| FmmError::io(format!("Failed to read directory {}", dir.display()), e))?;

        let mut entries = read_dir
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FmmError::io(format!("Failed to read directory {}", dir.display()), e))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut seen = BTreeSet::new();
        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if is_hidden(&file_name) || NON_ARTIFACTS.contains(&file_name.as_str()) {
                continue;
            }

            // follows symlinks, so linked mod directories count as directories
            let is_artifact = match std::fs::metadata(&path) {
                Ok(meta) => meta.is_dir() || (meta.is_file() && file_name.ends_with(".zip")),
                Err(e) => {
                    return Err(FmmError::load(
                        &path,
                        FmmError::io(format!("Failed to stat {}", path.display()), e),
                    ))
                },
            };

            if !is_artifact {
                debug!("Skipping non-release file {}", path.display());
                continue;
            }

            let release = read_release(&path).map_err(|e| FmmError::load(&path, e))?;
            seen.insert(release.name.clone());
            self.add_release(release);
        }

        Ok(seen)
    }

    /// Add a release, keeping the first one when the version is already known
    ///
    /// Returns `false` if the release was skipped as a duplicate.
    pub fn add_release(&mut self, release: Release) -> bool {
        match self.packages.get_mut(&release.name) {
            Some(package) => {
                let name = release.name.clone();
                let version = release.version;
                let inserted = package.insert_release(release);
                if !inserted {
                    warn!("Skipping duplicate release {} {}", name, version);
                }
                inserted
            },
            None => {
                self.packages
                    .insert(release.name.clone(), Package::new(release));
                true
            },
        }
    }

    /// Apply the enabled state stored in a `mod-list.json`
    ///
    /// Without a document only the base package is enabled. Entries that name
    /// unknown packages or versions are skipped.
    pub fn load_enabled_state(&mut self, path: &Path) -> RegistryResult<()> {
        let entries = match ModListJson::read(path)? {
            Some(doc) => doc.mods,
            None => {
                debug!("{} not found, enabling {} only", path.display(), self.options.base_package);
                vec![ModListEntry {
                    name: self.options.base_package.clone(),
                    enabled: true,
                    version: None,
                }]
            },
        };

        for entry in entries.into_iter().filter(|e| e.enabled) {
            let Some(package) = self.packages.get_mut(&entry.name) else {
                debug!("Ignoring unknown package {} in mod list", entry.name);
                continue;
            };

            match package.get_release(entry.version.as_ref()).map(|r| r.version) {
                Some(version) => {
                    package.set_enabled(version);
                },
                None => debug!(
                    "Ignoring unknown release {}@{} in mod list",
                    entry.name,
                    entry.version.map(|v| v.to_string()).unwrap_or_default()
                ),
            }
        }

        Ok(())
    }

    /// Path of this registry's `mod-list.json`
    pub fn mod_list_path(&self) -> PathBuf {
        self.mods_dir.join(MOD_LIST_FILE)
    }

    /// The user's mods directory
    pub fn mods_dir(&self) -> &Path {
        &self.mods_dir
    }

    /// All packages in name order
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Look up a package by name
    pub fn get_package(&self, name: &str) -> RegistryResult<&Package> {
        self.packages
            .get(name)
            .ok_or_else(|| FmmError::PackageNotFound {
                name: name.to_string(),
            })
    }

    fn get_package_mut(&mut self, name: &str) -> RegistryResult<&mut Package> {
        self.packages
            .get_mut(name)
            .ok_or_else(|| FmmError::PackageNotFound {
                name: name.to_string(),
            })
    }

    /// Check whether a package is exempt from `disable_all`
    pub fn is_internal(&self, name: &str) -> bool {
        self.internal.contains(name)
    }

    /// Enable a release: the pinned version if given, the newest otherwise
    ///
    /// Returns `None` when that release was already enabled.
    pub fn enable(&mut self, ident: &ModIdent) -> RegistryResult<Option<Version>> {
        let package = self.get_package_mut(&ident.name)?;
        let req = ident.version.map(VersionReq::exact).unwrap_or_default();

        let version = package
            .matching_release(&req)
            .map(|r| r.version)
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: ident.name.clone(),
                requirement: req.to_string(),
            })?;

        if package.enabled() == Some(version) {
            debug!("{} {} is already enabled", ident.name, version);
            return Ok(None);
        }

        package.set_enabled(version);
        info!("Enabled {} {}", ident.name, version);
        Ok(Some(version))
    }

    /// Disable a package
    pub fn disable(&mut self, name: &str) -> RegistryResult<()> {
        let package = self.get_package_mut(name)?;

        if package.disable().is_none() {
            return Err(FmmError::AlreadyDisabled {
                name: name.to_string(),
            });
        }

        info!("Disabled {}", name);
        Ok(())
    }

    /// Disable every package, returning how many changed
    ///
    /// Internal packages keep their state unless `include_internal` is set.
    pub fn disable_all(&mut self, include_internal: bool) -> usize {
        let internal = &self.internal;
        let count = self
            .packages
            .values_mut()
            .filter(|p| include_internal || !internal.contains(&p.name))
            .filter_map(Package::disable)
            .count();

        info!("Disabled {} packages", count);
        count
    }

    /// Enable the newest release of every package, returning how many changed
    pub fn enable_all(&mut self) -> usize {
        let mut count = 0;
        for package in self.packages.values_mut() {
            let Some(newest) = package.latest_release().map(|r| r.version) else {
                continue;
            };
            if package.enabled() != Some(newest) && package.set_enabled(newest) {
                count += 1;
            }
        }

        info!("Enabled {} packages", count);
        count
    }

    /// Remove a release and delete its artifact from the mods directory
    ///
    /// Removes the pinned version if given, the newest otherwise. Internal
    /// packages cannot be removed. A package left without releases is dropped.
    pub fn remove_release(&mut self, ident: &ModIdent) -> RegistryResult<Release> {
        if self.is_internal(&ident.name) {
            return Err(FmmError::InternalPackage {
                name: ident.name.clone(),
            });
        }

        let package = self.get_package(&ident.name)?;
        let version = package
            .get_release(ident.version.as_ref())
            .map(|r| r.version)
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: ident.name.clone(),
                requirement: ident
                    .version
                    .map(VersionReq::exact)
                    .unwrap_or_default()
                    .to_string(),
            })?;

        let release = self.take_release(&ident.name, &version)?;
        info!("Removed {} {}", release.name, release.version);
        Ok(release)
    }

    /// Keep only the newest zip archive of every non-internal package
    ///
    /// Unpacked directories are left alone. A package whose enabled release
    /// is removed gets its newest remaining release enabled. Returns the
    /// removed releases.
    pub fn dedup(&mut self) -> RegistryResult<Vec<Release>> {
        let mut stale: Vec<(String, Version)> = Vec::new();
        for package in self.packages.values() {
            if self.internal.contains(&package.name) {
                continue;
            }
            let archives: Vec<Version> = package
                .releases()
                .iter()
                .filter(|r| matches!(r.source, Source::Archive(_)))
                .map(|r| r.version)
                .collect();
            if let Some((_, older)) = archives.split_last() {
                stale.extend(older.iter().map(|v| (package.name.clone(), *v)));
            }
        }

        let mut removed = Vec::with_capacity(stale.len());
        for (name, version) in stale {
            let was_enabled = self.get_package(&name)?.enabled() == Some(version);
            let release = self.take_release(&name, &version)?;

            if was_enabled {
                if let Some(package) = self.packages.get_mut(&name) {
                    if let Some(newest) = package.latest_release().map(|r| r.version) {
                        package.set_enabled(newest);
                        debug!("Moved {} from {} to {}", name, version, newest);
                    }
                }
            }
            removed.push(release);
        }

        info!("Removed {} duplicate releases", removed.len());
        Ok(removed)
    }

    /// Detach one release and delete its artifact unless this is a dry run
    fn take_release(&mut self, name: &str, version: &Version) -> RegistryResult<Release> {
        let save = self.options.save;
        let package = self.get_package_mut(name)?;
        let release = package
            .get_release(Some(version))
            .cloned()
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: name.to_string(),
                requirement: VersionReq::exact(*version).to_string(),
            })?;

        if save {
            delete_artifact(&release)?;
        } else {
            debug!("Dry run, not deleting {} {}", name, version);
        }

        package.remove_release(version);
        if package.releases().is_empty() {
            self.packages.remove(name);
        }
        Ok(release)
    }

    /// Build the persisted document for the current state
    pub fn to_mod_list(&self) -> ModListJson {
        ModListJson {
            mods: self
                .packages
                .values()
                .map(|p| ModListEntry {
                    name: p.name.clone(),
                    enabled: p.is_enabled(),
                    version: p.enabled(),
                })
                .collect(),
        }
    }

    /// Persist the enabled state to `mod-list.json`
    ///
    /// Does nothing when saving is disabled.
    pub fn save(&self) -> RegistryResult<()> {
        if !self.options.save {
            debug!("Dry run, not writing {}", self.mod_list_path().display());
            return Ok(());
        }

        let path = self.mod_list_path();
        self.to_mod_list().write(&path)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Delete the file or directory a release was read from
fn delete_artifact(release: &Release) -> RegistryResult<()> {
    let path = match &release.source {
        Source::Archive(path) | Source::Directory(path) => path,
        Source::Portal { .. } => return Ok(()),
    };

    // symlink_metadata, so a linked mod directory loses only the link
    let meta = std::fs::symlink_metadata(path)
        .map_err(|e| FmmError::io(format!("Failed to stat {}", path.display()), e))?;
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    result.map_err(|e| FmmError::io(format!("Failed to delete {}", path.display()), e))?;
    debug!("Deleted {}", path.display());
    Ok(())
}
