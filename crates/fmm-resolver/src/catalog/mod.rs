//! Release catalogs.
//!
//! A [`Catalog`] answers two questions: which release satisfies a dependency,
//! and how to get that release's archive into a directory. The registry and the
//! mod portal both implement it; [`Fallback`] chains two catalogs and `Option`
//! stands for a catalog that is not configured.

mod local;
mod portal;

pub use local::LocalCatalog;

use crate::ResolverResult;
use async_trait::async_trait;
use fmm_core::{Dependency, FmmError, ModIdent, Release};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of release metadata and archives
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Newest release satisfying the dependency
    ///
    /// Fails with `PackageNotFound` or `NoMatchingRelease` when this catalog
    /// cannot supply one.
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release>;

    /// Place the release named by `ident` into `dest_dir`, returning its path
    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf>;
}

/// A catalog that is not configured knows no packages
#[async_trait]
impl<C: Catalog> Catalog for Option<C> {
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release> {
        match self {
            Some(catalog) => catalog.fetch_release(dependency).await,
            None => Err(FmmError::PackageNotFound {
                name: dependency.name.clone(),
            }),
        }
    }

    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf> {
        match self {
            Some(catalog) => catalog.download_archive(ident, dest_dir).await,
            None => Err(FmmError::PackageNotFound {
                name: ident.name.clone(),
            }),
        }
    }
}

#[async_trait]
impl<C: Catalog + ?Sized> Catalog for &C {
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release> {
        (**self).fetch_release(dependency).await
    }

    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf> {
        (**self).download_archive(ident, dest_dir).await
    }
}

/// Ask `primary` first and `secondary` only when `primary` has nothing
#[derive(Debug, Clone)]
pub struct Fallback<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> Fallback<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

/// Keep the primary's not-found error when the secondary does not know the package at all
fn pick_error(primary: FmmError, secondary: FmmError) -> FmmError {
    match secondary {
        FmmError::PackageNotFound { .. } => primary,
        other => other,
    }
}

#[async_trait]
impl<A: Catalog, B: Catalog> Catalog for Fallback<A, B> {
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release> {
        match self.primary.fetch_release(dependency).await {
            Err(primary) if primary.is_not_found() => {
                debug!("{}: {}, trying fallback catalog", dependency.name, primary);
                self.secondary
                    .fetch_release(dependency)
                    .await
                    .map_err(|secondary| pick_error(primary, secondary))
            },
            result => result,
        }
    }

    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf> {
        match self.primary.download_archive(ident, dest_dir).await {
            Err(primary) if primary.is_not_found() => {
                debug!("{}: {}, trying fallback catalog", ident, primary);
                self.secondary
                    .download_archive(ident, dest_dir)
                    .await
                    .map_err(|secondary| pick_error(primary, secondary))
            },
            result => result,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests;
