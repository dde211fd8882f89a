//! Configuration layering and environment overrides
//!
//! Layers apply lowest first: defaults, fmm.toml, player-data.json,
//! environment variables, command line flags.

use crate::json::{PlayerData, PLAYER_DATA_FILE};
use crate::toml::{parse_portal_url, validate_config, FmmToml};
use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use fmm_core::error::FmmError;
use fmm_core::{BASE_PACKAGE, DEFAULT_PORTAL_URL};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use url::Url;

/// Prefix of environment variables read as overrides
pub const ENV_PREFIX: &str = "FMM_";

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base for relative paths
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLayering;

/// Where a configuration layer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults
    Defaults,
    /// fmm.toml file
    File(Utf8PathBuf),
    /// Game's player-data.json
    PlayerData(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub game_dir: Utf8PathBuf,
    pub mods_dir: Utf8PathBuf,
    /// `mods_dir` was set rather than derived from `game_dir`
    pub explicit_mods_dir: bool,
    pub base_package: String,
    pub internal_packages: BTreeSet<String>,
    pub portal_url: Url,
    pub username: Option<String>,
    pub token: Option<String>,
    /// Layers that contributed, lowest first
    pub sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Make `path` absolute against the loader's working directory
    pub fn resolve_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Load fmm.toml
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and defaults apply otherwise.
    pub async fn load_config_file(
        &self,
        explicit: Option<&Utf8Path>,
    ) -> ConfigResult<(FmmToml, ConfigSource)> {
        if let Some(path) = explicit {
            let path = self.resolve_path(path);
            let config = crate::toml::load_from_file(&path).await?;
            return Ok((config, ConfigSource::File(path)));
        }

        match crate::toml::default_config_path() {
            Some(path) if path.is_file() => {
                let config = crate::toml::load_from_file(&path).await?;
                Ok((config, ConfigSource::File(path)))
            },
            _ => Ok((FmmToml::default(), ConfigSource::Defaults)),
        }
    }

    /// Load every layer, reading overrides from the process environment
    pub async fn load(
        &self,
        explicit_config: Option<&Utf8Path>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<Config> {
        let (file, source) = self.load_config_file(explicit_config).await?;
        let env_overrides = ConfigLayering::collect_env_overrides();
        self.load_layers(file, source, &env_overrides, cli_overrides)
            .await
    }

    /// Layer an already-loaded config file with player data and overrides
    ///
    /// player-data.json is looked up in the game directory the other layers
    /// select, so it is read after a first merge without it.
    pub async fn load_layers(
        &self,
        file: FmmToml,
        file_source: ConfigSource,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<Config> {
        let mut sources = vec![file_source];

        let without_player_data =
            ConfigLayering::merge(file.clone(), None, env_overrides, cli_overrides)?;
        let game_dir = self.game_dir(&without_player_data);
        let player_data_path = game_dir.join(PLAYER_DATA_FILE);

        let player_data = crate::json::load_from_file(&player_data_path).await?;
        if player_data.is_some() {
            debug!("Read player data from {}", player_data_path);
            sources.push(ConfigSource::PlayerData(player_data_path));
        }

        let mut env_keys: Vec<&String> = env_overrides
            .keys()
            .filter(|key| is_known_env_key(key))
            .collect();
        env_keys.sort();
        sources.extend(
            env_keys
                .into_iter()
                .map(|key| ConfigSource::Environment(key.clone())),
        );
        if !cli_overrides.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }

        let merged = ConfigLayering::merge(file, player_data, env_overrides, cli_overrides)?;
        self.resolve(merged, sources)
    }

    fn game_dir(&self, config: &FmmToml) -> Utf8PathBuf {
        config
            .game_dir
            .as_deref()
            .map(|dir| self.resolve_path(dir))
            .unwrap_or_else(|| self.cwd.clone())
    }

    /// Fill defaults into a merged layer stack
    fn resolve(&self, merged: FmmToml, sources: Vec<ConfigSource>) -> ConfigResult<Config> {
        let game_dir = self.game_dir(&merged);
        let explicit_mods_dir = merged.mods_dir.is_some();
        let mods_dir = merged
            .mods_dir
            .as_deref()
            .map(|dir| self.resolve_path(dir))
            .unwrap_or_else(|| game_dir.join("mods"));

        let base_package = merged
            .base_package
            .unwrap_or_else(|| BASE_PACKAGE.to_string());

        let mut internal_packages: BTreeSet<String> = merged
            .internal_packages
            .map(|names| names.into_iter().collect())
            .unwrap_or_default();
        internal_packages.insert(base_package.clone());

        let portal_url =
            parse_portal_url(merged.portal_url.as_deref().unwrap_or(DEFAULT_PORTAL_URL))?;

        Ok(Config {
            game_dir,
            mods_dir,
            explicit_mods_dir,
            base_package,
            internal_packages,
            portal_url,
            username: merged.username,
            token: merged.token,
            sources,
        })
    }
}

impl ConfigLayering {
    /// Merge configuration layers
    pub fn merge(
        file: FmmToml,
        player_data: Option<PlayerData>,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<FmmToml> {
        let mut merged = file;

        if let Some((username, token)) = player_data.as_ref().and_then(PlayerData::credentials) {
            merged.username = Some(username.to_string());
            merged.token = Some(token.to_string());
        }

        Self::apply_env_overrides(&mut merged, env_overrides);

        // Highest priority
        Self::apply_cli_overrides(&mut merged, cli_overrides);

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(config: &mut FmmToml, overrides: &HashMap<String, String>) {
        for (key, value) in overrides {
            match key.as_str() {
                "FMM_GAME_DIR" => config.game_dir = Some(Utf8PathBuf::from(value)),
                "FMM_MODS_DIR" => config.mods_dir = Some(Utf8PathBuf::from(value)),
                "FMM_PORTAL_URL" => config.portal_url = Some(value.clone()),
                "FMM_USERNAME" => config.username = Some(value.clone()),
                "FMM_TOKEN" => config.token = Some(value.clone()),
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }
    }

    /// Apply CLI flag overrides
    pub fn apply_cli_overrides(config: &mut FmmToml, overrides: &HashMap<String, String>) {
        for (key, value) in overrides {
            match key.as_str() {
                "game_dir" => config.game_dir = Some(Utf8PathBuf::from(value)),
                "mods_dir" => config.mods_dir = Some(Utf8PathBuf::from(value)),
                "portal_url" => config.portal_url = Some(value.clone()),
                _ => {},
            }
        }
    }

    /// Collect `FMM_*` environment variables
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn is_known_env_key(key: &str) -> bool {
    matches!(
        key,
        "FMM_GAME_DIR" | "FMM_MODS_DIR" | "FMM_PORTAL_URL" | "FMM_USERNAME" | "FMM_TOKEN"
    )
}

impl Config {
    /// Check that `game_dir` looks like a game installation
    pub fn validate_game_dir(&self) -> ConfigResult<()> {
        let markers = [
            self.game_dir.join("config-path.cfg"),
            self.game_dir.join("config").join("config.ini"),
        ];

        if markers.iter().any(|marker| marker.is_file()) {
            Ok(())
        } else {
            Err(FmmError::InvalidGameDir {
                path: self.game_dir.as_std_path().to_path_buf(),
            })
        }
    }

    /// Directories holding packages shipped with the game
    pub fn internal_sources(&self) -> Vec<Utf8PathBuf> {
        let data = self.game_dir.join("data");
        if data.is_dir() {
            vec![data]
        } else {
            Vec::new()
        }
    }

    pub fn player_data_path(&self) -> Utf8PathBuf {
        self.game_dir.join(PLAYER_DATA_FILE)
    }

    /// Portal username and token, when both are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.token.as_deref()?))
    }
}
