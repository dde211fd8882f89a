//! Filesystem-backed catalog over the local registry.

use super::Catalog;
use crate::ResolverResult;
use async_trait::async_trait;
use fmm_core::{Dependency, FmmError, ModIdent, Release, Source};
use fmm_registry::Registry;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Catalog answering from the releases the registry loaded
#[derive(Debug, Clone, Copy)]
pub struct LocalCatalog<'a> {
    registry: &'a Registry,
}

impl<'a> LocalCatalog<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    fn find_release(&self, ident: &ModIdent) -> ResolverResult<&'a Release> {
        let package = self.registry.get_package(&ident.name)?;
        package
            .get_release(ident.version.as_ref())
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: ident.name.clone(),
                requirement: Dependency::from(ident).version_req.to_string(),
            })
    }
}

#[async_trait]
impl Catalog for LocalCatalog<'_> {
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release> {
        let package = self.registry.get_package(&dependency.name)?;

        package
            .matching_release(&dependency.version_req)
            .cloned()
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: dependency.name.clone(),
                requirement: dependency.version_req.to_string(),
            })
    }

    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf> {
        let release = self.find_release(ident)?;

        let (source, is_dir) = match &release.source {
            Source::Archive(path) => (path.clone(), false),
            Source::Directory(path) => (path.clone(), true),
            Source::Portal { .. } => {
                return Err(FmmError::NoMatchingRelease {
                    name: ident.name.clone(),
                    requirement: "a local release".to_string(),
                })
            },
        };

        let file_name = source.file_name().ok_or_else(|| FmmError::InfoJson {
            path: source.clone(),
            message: "release path has no file name".to_string(),
            source: None,
        })?;
        let dest = dest_dir.join(file_name);

        if dest == source {
            debug!("{} is already in {}", ident, dest_dir.display());
            return Ok(dest);
        }

        if is_dir {
            let (from, to) = (source.clone(), dest.clone());
            tokio::task::spawn_blocking(move || copy_dir(&from, &to))
                .await
                .map_err(|e| {
                    FmmError::io(
                        "Directory copy task failed".to_string(),
                        std::io::Error::other(e),
                    )
                })??;
        } else {
            tokio::fs::copy(&source, &dest).await.map_err(|e| {
                FmmError::io(
                    format!("Failed to copy {} to {}", source.display(), dest.display()),
                    e,
                )
            })?;
        }

        debug!("Copied {} to {}", source.display(), dest.display());
        Ok(dest)
    }
}

/// Recursively copy a mod directory
fn copy_dir(from: &Path, to: &Path) -> ResolverResult<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| {
            let message = format!("Failed to walk {}", from.display());
            FmmError::io(message, std::io::Error::from(e))
        })?;

        let relative = entry.path().strip_prefix(from).map_err(|_| FmmError::Io {
            message: format!("{} escaped {}", entry.path().display(), from.display()),
            source: std::io::Error::from(std::io::ErrorKind::InvalidData),
        })?;
        let target = to.join(relative);

        let result = if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
        } else {
            std::fs::copy(entry.path(), &target).map(|_| ())
        };
        result.map_err(|e| FmmError::io(format!("Failed to copy to {}", target.display()), e))?;
    }

    Ok(())
}
