//! HTTP-backed catalog over the mod portal.

use super::Catalog;
use crate::ResolverResult;
use async_trait::async_trait;
use fmm_core::{Dependency, ModIdent, Release};
use fmm_portal::PortalClient;
use std::path::{Path, PathBuf};

#[async_trait]
impl Catalog for PortalClient {
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release> {
        PortalClient::fetch_release(self, dependency).await
    }

    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf> {
        self.download(ident, dest_dir).await
    }
}
