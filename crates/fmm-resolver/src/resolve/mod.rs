//! Breadth-first dependency expansion
//!
//! Resolution is greedy: every package is resolved once, to the newest release
//! its first requester accepts. Later requirements on an already-resolved
//! package are not checked against that choice.

use crate::catalog::Catalog;
use crate::ResolverResult;
use fmm_core::{Dependency, FmmError, ModIdent, Release, Version, BASE_PACKAGE};
use indexmap::IndexSet;
use tracing::{debug, warn};

/// Dependency resolver over a release catalog
#[derive(Debug)]
pub struct Resolver<C> {
    catalog: C,
    /// Always present, never looked up
    base_package: String,
}

/// Outcome of a resolution run
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved releases, one per package, in discovery order
    pub packages: Vec<Release>,
    /// Dependencies that could not be resolved, with the reason
    pub failures: Vec<(Dependency, FmmError)>,
    /// Incompatibilities among the resolved releases
    pub conflicts: Vec<Conflict>,
}

/// A resolved release declares another resolved release incompatible
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{package} {version} is incompatible with {conflicting} {conflicting_version}")]
pub struct Conflict {
    /// Package declaring the incompatibility
    pub package: String,
    pub version: Version,
    /// Resolved package it is incompatible with
    pub conflicting: String,
    pub conflicting_version: Version,
}

impl<C: Catalog> Resolver<C> {
    /// Create a resolver that treats `base` as always present
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            base_package: BASE_PACKAGE.to_string(),
        }
    }

    /// Override the always-present package
    pub fn with_base_package(mut self, name: impl Into<String>) -> Self {
        self.base_package = name.into();
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Expand `requested` into its transitive closure of required dependencies
    ///
    /// A failure on one package is recorded and does not stop its siblings.
    pub async fn resolve(&self, requested: &[ModIdent]) -> Resolution {
        // append-only work table; `cursor` is the next item to process
        let mut queue: Vec<Dependency> = requested.iter().map(Dependency::from).collect();
        let mut cursor = 0;
        let mut visited: IndexSet<String> = IndexSet::new();
        let mut resolution = Resolution::default();

        while let Some(dependency) = queue.get(cursor).cloned() {
            cursor += 1;

            if dependency.name == self.base_package || !visited.insert(dependency.name.clone()) {
                continue;
            }

            match self.catalog.fetch_release(&dependency).await {
                Ok(release) => {
                    debug!("Resolved {} to {}", dependency, release.version);

                    queue.extend(
                        release
                            .expanded_dependencies()
                            .filter(|d| d.name != self.base_package && !visited.contains(&d.name))
                            .cloned(),
                    );
                    resolution.packages.push(release);
                },
                Err(error) => {
                    warn!("Failed to resolve {}: {}", dependency, error);
                    resolution.failures.push((dependency, error));
                },
            }
        }

        resolution.conflicts = find_conflicts(&resolution.packages);
        resolution
    }
}

/// Incompatible dependencies satisfied by another resolved release
fn find_conflicts(packages: &[Release]) -> Vec<Conflict> {
    packages
        .iter()
        .flat_map(|release| {
            release.incompatibilities().filter_map(move |incompatible| {
                packages
                    .iter()
                    .find(|other| other.name == incompatible.name && incompatible.matches(&other.version))
                    .map(|other| Conflict {
                        package: release.name.clone(),
                        version: release.version,
                        conflicting: other.name.clone(),
                        conflicting_version: other.version,
                    })
            })
        })
        .collect()
}

impl Resolution {
    /// Identities of every resolved release, pinned to the resolved version
    pub fn idents(&self) -> Vec<ModIdent> {
        self.packages.iter().map(Release::ident).collect()
    }

    /// Resolved release of a package, if any
    pub fn get(&self, name: &str) -> Option<&Release> {
        self.packages.iter().find(|r| r.name == name)
    }

    /// Check that every dependency resolved
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn recorded failures into a single error naming every failed package
    pub fn into_result(self) -> ResolverResult<Vec<Release>> {
        if self.failures.is_empty() {
            return Ok(self.packages);
        }

        Err(FmmError::Resolution {
            failures: self
                .failures
                .into_iter()
                .map(|(dependency, error)| (dependency.name, error))
                .collect(),
        })
    }
}
