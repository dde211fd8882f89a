//! Unit tests for CLI commands.

use super::*;
use crate::output::colors::ColorSupport;
use camino::Utf8Path;
use fmm_core::{Package, Release, Source};
use std::collections::BTreeSet;
use std::io::Write;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Game directory with `data/` and `mods/` in a temporary directory
struct Game {
    _root: TempDir,
    dir: Utf8PathBuf,
}

impl Game {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(root.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(dir.join("data")).unwrap();
        std::fs::create_dir_all(dir.join("mods")).unwrap();
        Self { _root: root, dir }
    }

    fn mods(&self) -> Utf8PathBuf {
        self.dir.join("mods")
    }

    fn info(name: &str, version: &str, deps: &[&str]) -> String {
        serde_json::json!({ "name": name, "version": version, "dependencies": deps }).to_string()
    }

    /// Unpacked release directory under `parent`
    fn add_mod(&self, parent: &Utf8Path, name: &str, version: &str, deps: &[&str]) {
        let dir = parent.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("info.json"), Self::info(name, version, deps)).unwrap();
    }

    fn zip_bytes(name: &str, version: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options: FileOptions<()> = FileOptions::default();
        zip.start_file(format!("{}_{}/info.json", name, version), options)
            .unwrap();
        zip.write_all(Self::info(name, version, &[]).as_bytes())
            .unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn context(&self, portal_url: &str, dry_run: bool) -> CommandContext {
        let config = Config {
            game_dir: self.dir.clone(),
            mods_dir: self.mods(),
            explicit_mods_dir: true,
            base_package: "base".to_string(),
            internal_packages: BTreeSet::from(["base".to_string()]),
            portal_url: fmm_config::toml::parse_portal_url(portal_url).unwrap(),
            username: None,
            token: None,
            sources: Vec::new(),
        };
        CommandContext::with_config(
            config,
            dry_run,
            OutputHandler::with_colors(ColorSupport::disabled()),
        )
    }

    /// `(name, version)` of every enabled entry in mod-list.json
    fn enabled(&self) -> Vec<(String, Option<String>)> {
        let content = std::fs::read_to_string(self.mods().join("mod-list.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&content).unwrap();
        doc["mods"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|entry| entry["enabled"].as_bool() == Some(true))
            .map(|entry| {
                (
                    entry["name"].as_str().unwrap().to_string(),
                    entry["version"].as_str().map(str::to_string),
                )
            })
            .collect()
    }
}

// never contacted; nothing listens on port 9
const OFFLINE_PORTAL: &str = "http://127.0.0.1:9";

fn ident(s: &str) -> ModIdent {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_enable_resolves_local_dependencies() {
    let game = Game::new();
    game.add_mod(&game.dir.join("data"), "base", "1.1.0", &[]);
    game.add_mod(&game.mods(), "a", "1.0.0", &["base >= 1.1", "b >= 1.0", "? c"]);
    game.add_mod(&game.mods(), "b", "1.0.0", &[]);
    game.add_mod(&game.mods(), "c", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a")], false, &ctx).await.unwrap();

    assert_eq!(ctx.error_count(), 0);
    assert_eq!(
        game.enabled(),
        vec![
            ("a".to_string(), Some("1.0.0".to_string())),
            ("b".to_string(), Some("1.0.0".to_string())),
            ("base".to_string(), Some("1.1.0".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_enable_ignore_deps() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &["b"]);
    game.add_mod(&game.mods(), "b", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a")], true, &ctx).await.unwrap();

    assert_eq!(
        game.enabled(),
        vec![("a".to_string(), Some("1.0.0".to_string()))]
    );
}

#[tokio::test]
async fn test_enable_dry_run_writes_nothing() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, true);

    enable::execute(&[ident("a")], false, &ctx).await.unwrap();

    assert!(!game.mods().join("mod-list.json").exists());
}

#[tokio::test]
async fn test_enable_reports_missing_dependency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mods/missing/full"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &["missing"]);
    let ctx = game.context(&server.uri(), false);

    enable::execute(&[ident("a")], false, &ctx).await.unwrap();

    assert_eq!(ctx.error_count(), 1);
    assert_eq!(
        game.enabled(),
        vec![("a".to_string(), Some("1.0.0".to_string()))]
    );
}

#[tokio::test]
async fn test_enable_downloads_from_portal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mods/b/full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "b",
            "releases": [{
                "download_url": "/download/b/1",
                "file_name": "b_1.0.0.zip",
                "info_json": { "dependencies": [] },
                "version": "1.0.0"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/b/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(Game::zip_bytes("b", "1.0.0")))
        .mount(&server)
        .await;

    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &["b"]);
    let mut ctx = game.context(&server.uri(), false);
    ctx.config.username = Some("engineer".to_string());
    ctx.config.token = Some("secret".to_string());

    enable::execute(&[ident("a")], false, &ctx).await.unwrap();

    assert_eq!(ctx.error_count(), 0);
    assert!(game.mods().join("b_1.0.0.zip").is_file());
    assert_eq!(
        game.enabled(),
        vec![
            ("a".to_string(), Some("1.0.0".to_string())),
            ("b".to_string(), Some("1.0.0".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_download_without_credentials_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mods/b/full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "b",
            "releases": [{
                "download_url": "/download/b/1",
                "file_name": "b_1.0.0.zip",
                "version": "1.0.0"
            }]
        })))
        .mount(&server)
        .await;

    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &["b"]);
    let ctx = game.context(&server.uri(), false);

    enable::execute(&[ident("a")], false, &ctx).await.unwrap();

    assert_eq!(ctx.error_count(), 1);
    assert!(!game.mods().join("b_1.0.0.zip").exists());
    assert_eq!(
        game.enabled(),
        vec![("a".to_string(), Some("1.0.0".to_string()))]
    );
}

#[tokio::test]
async fn test_install_does_not_enable() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    install::execute(&[ident("a")], &ctx).await.unwrap();

    assert_eq!(ctx.error_count(), 0);
    assert!(!game.mods().join("mod-list.json").exists());
}

#[tokio::test]
async fn test_disable_reports_unknown_and_continues() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    game.add_mod(&game.mods(), "b", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a"), ident("b")], true, &ctx)
        .await
        .unwrap();
    disable::execute(&[ident("zzz"), ident("a@1.0.0")], false, &ctx)
        .await
        .unwrap();

    assert_eq!(ctx.error_count(), 1);
    assert_eq!(
        game.enabled(),
        vec![("b".to_string(), Some("1.0.0".to_string()))]
    );
}

#[tokio::test]
async fn test_disable_all_keeps_internal_packages() {
    let game = Game::new();
    game.add_mod(&game.dir.join("data"), "base", "1.1.0", &[]);
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a")], true, &ctx).await.unwrap();
    disable::execute(&[], false, &ctx).await.unwrap();

    assert_eq!(
        game.enabled(),
        vec![("base".to_string(), Some("1.1.0".to_string()))]
    );
}

#[tokio::test]
async fn test_disable_all_including_internal() {
    let game = Game::new();
    game.add_mod(&game.dir.join("data"), "base", "1.1.0", &[]);
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a")], true, &ctx).await.unwrap();
    disable::execute(&[], true, &ctx).await.unwrap();

    assert!(game.enabled().is_empty());
}

#[tokio::test]
async fn test_enable_all() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    game.add_mod(&game.mods(), "b", "2.0.0", &["missing"]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute_all(&ctx).await.unwrap();

    assert_eq!(ctx.error_count(), 0);
    assert_eq!(
        game.enabled(),
        vec![
            ("a".to_string(), Some("1.0.0".to_string())),
            ("b".to_string(), Some("2.0.0".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_remove_deletes_release_and_disables() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    game.add_mod(&game.mods(), "b", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a"), ident("b")], true, &ctx)
        .await
        .unwrap();
    remove::execute(&[ident("a"), ident("b@9.0.0")], &ctx)
        .await
        .unwrap();

    assert_eq!(ctx.error_count(), 1);
    assert!(!game.mods().join("a").exists());
    assert!(game.mods().join("b").exists());
    assert_eq!(
        game.enabled(),
        vec![("b".to_string(), Some("1.0.0".to_string()))]
    );
}

#[tokio::test]
async fn test_remove_dry_run_keeps_files() {
    let game = Game::new();
    game.add_mod(&game.mods(), "a", "1.0.0", &[]);
    let ctx = game.context(OFFLINE_PORTAL, true);

    remove::execute(&[ident("a")], &ctx).await.unwrap();

    assert!(game.mods().join("a").join("info.json").is_file());
    assert!(!game.mods().join("mod-list.json").exists());
}

#[tokio::test]
async fn test_dedup_keeps_newest_archive() {
    let game = Game::new();
    for version in ["1.0.0", "1.1.0"] {
        std::fs::write(
            game.mods().join(format!("a_{}.zip", version)),
            Game::zip_bytes("a", version),
        )
        .unwrap();
    }
    let ctx = game.context(OFFLINE_PORTAL, false);

    enable::execute(&[ident("a@1.0.0")], true, &ctx)
        .await
        .unwrap();
    dedup::execute(&ctx).await.unwrap();

    assert!(!game.mods().join("a_1.0.0.zip").exists());
    assert!(game.mods().join("a_1.1.0.zip").is_file());
    assert_eq!(
        game.enabled(),
        vec![("a".to_string(), Some("1.1.0".to_string()))]
    );
}

#[tokio::test]
async fn test_fetch_counts_downloaded_releases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mods/b/full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "b",
            "releases": [{
                "download_url": "/download/b/2",
                "file_name": "b_2.0.0.zip",
                "version": "2.0.0"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/b/2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(Game::zip_bytes("b", "2.0.0")))
        .mount(&server)
        .await;

    let game = Game::new();
    game.add_mod(&game.mods(), "b", "1.0.0", &[]);
    let mut ctx = game.context(&server.uri(), false);
    ctx.config.username = Some("engineer".to_string());
    ctx.config.token = Some("secret".to_string());

    // b is installed, but not at the requested version
    let mut registry = ctx.load_registry().unwrap();
    let fetched = resolve_and_fetch(&mut registry, &[ident("b@2.0.0")], &ctx)
        .await
        .unwrap();

    assert_eq!(fetched.downloaded, 1);
    assert_eq!(fetched.available, vec![ident("b@2.0.0")]);
    assert_eq!(registry.get_package("b").unwrap().releases().len(), 2);

    let fetched = resolve_and_fetch(&mut registry, &[ident("b@2.0.0")], &ctx)
        .await
        .unwrap();
    assert_eq!(fetched.downloaded, 0);
}

#[tokio::test]
async fn test_broken_release_aborts() {
    let game = Game::new();
    std::fs::write(game.mods().join("x_1.0.0.zip"), b"not a zip").unwrap();
    let ctx = game.context(OFFLINE_PORTAL, false);

    let err = list::execute(&ctx).await.unwrap_err();
    assert!(matches!(err, FmmError::Load { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_game_dir_is_validated_for_derived_mods_dir() {
    let game = Game::new();
    let mut ctx = game.context(OFFLINE_PORTAL, false);
    ctx.config.explicit_mods_dir = false;

    let err = list::execute(&ctx).await.unwrap_err();
    assert!(matches!(err, FmmError::InvalidGameDir { .. }));

    std::fs::write(game.dir.join("config-path.cfg"), "").unwrap();
    list::execute(&ctx).await.unwrap();
}

#[test]
fn test_format_package() {
    let release = |version: &str| Release {
        name: "flib".to_string(),
        version: version.parse().unwrap(),
        dependencies: Vec::new(),
        source: Source::Directory("flib".into()),
    };
    let mut package = Package::new(release("0.12.0"));
    package.insert_release(release("0.11.0"));
    assert!(package.set_enabled("0.12.0".parse().unwrap()));

    let colors = ColorSupport::disabled();
    assert_eq!(
        list::format_package(&package, false, &colors),
        "flib 0.11.0 *0.12.0"
    );
    assert_eq!(
        list::format_package(&package, true, &colors),
        "flib 0.11.0 *0.12.0 (internal)"
    );
}
