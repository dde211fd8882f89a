//! fmm.toml configuration parsing and serialization

use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use fmm_core::error::FmmError;
use serde::{Deserialize, Serialize};
use url::Url;

/// File name of the configuration file
pub const CONFIG_FILE: &str = "fmm.toml";

/// Complete fmm.toml configuration; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FmmToml {
    /// Game installation directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_dir: Option<Utf8PathBuf>,

    /// Mods directory (defaults to `{game_dir}/mods`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mods_dir: Option<Utf8PathBuf>,

    /// Always-present package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,

    /// Packages that `disable` without arguments leaves alone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_packages: Option<Vec<String>>,

    /// Mod portal root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,

    /// Portal username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Portal download token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Parse TOML string to FmmToml configuration
pub fn parse_fmm_toml(content: &str) -> ConfigResult<FmmToml> {
    let config: FmmToml = toml::from_str(content).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        FmmError::TomlParse {
            message: e.message().to_string(),
            line,
            column,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize FmmToml to TOML string
pub fn serialize_fmm_toml(config: &FmmToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| FmmError::ConfigValidation {
        field: "fmm.toml".to_string(),
        reason: format!("TOML serialization error: {}", e),
    })
}

/// Validate field values
pub fn validate_config(config: &FmmToml) -> ConfigResult<()> {
    if let Some(base) = &config.base_package {
        if base.trim().is_empty() {
            return Err(FmmError::ConfigValidation {
                field: "base_package".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    if let Some(internal) = &config.internal_packages {
        if internal.iter().any(|name| name.trim().is_empty()) {
            return Err(FmmError::ConfigValidation {
                field: "internal_packages".to_string(),
                reason: "package names must not be empty".to_string(),
            });
        }
    }

    if let Some(portal_url) = &config.portal_url {
        parse_portal_url(portal_url)?;
    }

    Ok(())
}

/// Parse and check a portal URL (http or https)
pub fn parse_portal_url(input: &str) -> ConfigResult<Url> {
    let invalid = |reason: String| FmmError::ConfigValidation {
        field: "portal_url".to_string(),
        reason,
    };

    let url = Url::parse(input).map_err(|e| invalid(format!("'{}': {}", input, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme '{}'", scheme))),
    }
}

/// Load and parse fmm.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<FmmToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FmmError::io(format!("Failed to read {}", path), e))?;

    parse_fmm_toml(&content).map_err(|e| match e {
        FmmError::TomlParse {
            message,
            line,
            column,
        } => FmmError::TomlParse {
            message: format!("in {}: {}", path, message),
            line,
            column,
        },
        other => other,
    })
}

/// `{config_dir}/fmm/fmm.toml`, if the platform has a config directory
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let dir = dirs::config_dir()?;
    let dir = Utf8PathBuf::try_from(dir).ok()?;
    Some(dir.join("fmm").join(CONFIG_FILE))
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) + 1;
    (line, column)
}
