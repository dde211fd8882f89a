//! player-data.json parsing
//!
//! The game stores the logged-in portal account here; fmm only reads the
//! download credentials.

use crate::ConfigResult;
use camino::Utf8Path;
use fmm_core::error::FmmError;
use serde::{Deserialize, Serialize};

/// File name inside the game directory
pub const PLAYER_DATA_FILE: &str = "player-data.json";

/// The parts of player-data.json fmm uses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    #[serde(rename = "service-username", skip_serializing_if = "Option::is_none")]
    pub service_username: Option<String>,

    #[serde(rename = "service-token", skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
}

impl PlayerData {
    /// Username and token, when both are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.service_username.as_deref().filter(|s| !s.is_empty())?;
        let token = self.service_token.as_deref().filter(|s| !s.is_empty())?;
        Some((username, token))
    }
}

/// Parse player-data.json content
pub fn parse_player_data(path: &Utf8Path, content: &str) -> ConfigResult<PlayerData> {
    serde_json::from_str(content).map_err(|e| FmmError::JsonParse {
        path: path.as_std_path().to_path_buf(),
        message: e.to_string(),
    })
}

/// Load player-data.json, `None` when the file does not exist
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<Option<PlayerData>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FmmError::io(format!("Failed to read {}", path), e)),
    };

    parse_player_data(path, &content).map(Some)
}
