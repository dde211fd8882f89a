//! Unit tests for catalogs, plus an in-memory catalog shared with the resolver tests

use super::*;
use fmm_core::{Source, Version};
use fmm_registry::{Registry, RegistryOptions};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory catalog that records every lookup
#[derive(Debug, Default)]
pub(crate) struct MockCatalog {
    releases: HashMap<String, Vec<Release>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

pub(crate) fn release(name: &str, version: &str, deps: &[&str]) -> Release {
    Release {
        name: name.to_string(),
        version: version.parse().unwrap(),
        dependencies: deps.iter().map(|d| d.parse().unwrap()).collect(),
        source: Source::Archive(PathBuf::from(format!("{}_{}.zip", name, version))),
    }
}

impl MockCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, name: &str, version: &str, deps: &[&str]) -> Self {
        let releases = self.releases.entry(name.to_string()).or_default();
        releases.push(release(name, version, deps));
        releases.sort_by(|a, b| a.version.cmp(&b.version));
        self
    }

    /// Lookups of `name` fail with a network error
    pub(crate) fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn lookup(&self, name: &str) -> ResolverResult<&[Release]> {
        self.calls.lock().unwrap().push(name.to_string());

        if self.failing.contains(name) {
            return Err(FmmError::Network {
                message: format!("connection reset fetching {}", name),
                source: None,
            });
        }

        self.releases
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FmmError::PackageNotFound {
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn fetch_release(&self, dependency: &Dependency) -> ResolverResult<Release> {
        self.lookup(&dependency.name)?
            .iter()
            .rev()
            .find(|r| dependency.matches(&r.version))
            .cloned()
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: dependency.name.clone(),
                requirement: dependency.version_req.to_string(),
            })
    }

    async fn download_archive(&self, ident: &ModIdent, dest_dir: &Path) -> ResolverResult<PathBuf> {
        let dependency = Dependency::from(ident);
        let release = self.fetch_release(&dependency).await?;
        let path = dest_dir.join(release.archive_name());
        std::fs::write(&path, b"mock archive").unwrap();
        Ok(path)
    }
}

fn dep(s: &str) -> Dependency {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_absent_catalog_knows_nothing() {
    let catalog: Option<MockCatalog> = None;

    let err = catalog.fetch_release(&dep("a")).await.unwrap_err();
    assert!(matches!(err, FmmError::PackageNotFound { .. }));

    let dir = tempfile::tempdir().unwrap();
    let err = catalog
        .download_archive(&ModIdent::new("a"), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, FmmError::PackageNotFound { .. }));
}

#[tokio::test]
async fn test_fallback_prefers_primary() {
    let primary = MockCatalog::new().with("a", "1.0.0", &[]);
    let secondary = MockCatalog::new().with("a", "2.0.0", &[]).with("b", "1.0.0", &[]);
    let catalog = Fallback::new(&primary, &secondary);

    let a = catalog.fetch_release(&dep("a")).await.unwrap();
    assert_eq!(a.version, Version::new(1, 0, 0));
    assert!(secondary.calls().is_empty());

    let b = catalog.fetch_release(&dep("b")).await.unwrap();
    assert_eq!(b.name, "b");
    assert_eq!(secondary.calls(), vec!["b"]);
}

#[tokio::test]
async fn test_fallback_on_no_matching_release() {
    let primary = MockCatalog::new().with("a", "1.0.0", &[]);
    let secondary = MockCatalog::new().with("a", "2.0.0", &[]);
    let catalog = Fallback::new(&primary, &secondary);

    let a = catalog.fetch_release(&dep("a >= 2.0")).await.unwrap();
    assert_eq!(a.version, Version::new(2, 0, 0));
}

#[tokio::test]
async fn test_fallback_keeps_primary_error_when_secondary_has_nothing() {
    let primary = MockCatalog::new().with("a", "1.0.0", &[]);
    let catalog = Fallback::new(&primary, None::<MockCatalog>);

    let err = catalog.fetch_release(&dep("a >= 2.0")).await.unwrap_err();
    assert!(matches!(err, FmmError::NoMatchingRelease { .. }));
}

#[tokio::test]
async fn test_fallback_does_not_hide_network_errors() {
    let primary = MockCatalog::new().failing("a");
    let secondary = MockCatalog::new().with("a", "1.0.0", &[]);
    let catalog = Fallback::new(&primary, &secondary);

    let err = catalog.fetch_release(&dep("a")).await.unwrap_err();
    assert!(matches!(err, FmmError::Network { .. }));
    assert!(secondary.calls().is_empty());
}

#[tokio::test]
async fn test_fallback_download() {
    let primary = MockCatalog::new();
    let secondary = MockCatalog::new().with("b", "1.2.0", &[]);
    let catalog = Fallback::new(&primary, &secondary);
    let dir = tempfile::tempdir().unwrap();

    let path = catalog
        .download_archive(&ModIdent::new("b"), dir.path())
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("b_1.2.0.zip"));
}

fn registry_with(releases: Vec<Release>) -> Registry {
    let mut registry = Registry::new("mods", RegistryOptions::default());
    for release in releases {
        registry.add_release(release);
    }
    registry
}

#[tokio::test]
async fn test_local_catalog_fetch_release() {
    let registry = registry_with(vec![
        release("x", "1.0.0", &[]),
        release("x", "1.2.0", &["base"]),
    ]);
    let catalog = LocalCatalog::new(&registry);

    let newest = catalog.fetch_release(&dep("x")).await.unwrap();
    assert_eq!(newest.version, Version::new(1, 2, 0));

    let old = catalog.fetch_release(&dep("x < 1.2")).await.unwrap();
    assert_eq!(old.version, Version::new(1, 0, 0));

    let err = catalog.fetch_release(&dep("y >= 1.1.0")).await.unwrap_err();
    assert!(matches!(err, FmmError::PackageNotFound { .. }));

    let err = catalog.fetch_release(&dep("x >= 2.0")).await.unwrap_err();
    assert!(matches!(err, FmmError::NoMatchingRelease { .. }));
}

#[tokio::test]
async fn test_local_catalog_copies_archive_and_directory() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();

    let archive = src.path().join("x_1.0.0.zip");
    std::fs::write(&archive, b"zip").unwrap();

    let dir = src.path().join("y");
    std::fs::create_dir_all(dir.join("graphics")).unwrap();
    std::fs::write(dir.join("info.json"), "{}").unwrap();
    std::fs::write(dir.join("graphics").join("icon.png"), b"png").unwrap();

    let mut x = release("x", "1.0.0", &[]);
    x.source = Source::Archive(archive);
    let mut y = release("y", "0.1.0", &[]);
    y.source = Source::Directory(dir);

    let registry = registry_with(vec![x, y]);
    let catalog = LocalCatalog::new(&registry);

    let copied = catalog
        .download_archive(&ModIdent::new("x"), dest.path())
        .await
        .unwrap();
    assert_eq!(std::fs::read(copied).unwrap(), b"zip");

    let copied = catalog
        .download_archive(&ModIdent::new("y"), dest.path())
        .await
        .unwrap();
    assert_eq!(copied, dest.path().join("y"));
    assert_eq!(
        std::fs::read(copied.join("graphics").join("icon.png")).unwrap(),
        b"png"
    );

    let pinned = ModIdent::with_version("x", Version::new(9, 0, 0));
    let err = catalog
        .download_archive(&pinned, dest.path())
        .await
        .unwrap_err();
    assert!(matches!(err, FmmError::NoMatchingRelease { .. }));
}
