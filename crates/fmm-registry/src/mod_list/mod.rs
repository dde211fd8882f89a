//! `mod-list.json` document.
//!
//! The game reads the enabled set from this file in the mods directory.

use crate::RegistryResult;
use fmm_core::utils::write_atomic;
use fmm_core::{FmmError, Version};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the enabled-set document inside the mods directory
pub const MOD_LIST_FILE: &str = "mod-list.json";

/// Persisted enabled set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModListJson {
    pub mods: Vec<ModListEntry>,
}

/// One mod's persisted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModListEntry {
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl ModListJson {
    /// Read the document, `None` when the file does not exist
    pub fn read(path: &Path) -> RegistryResult<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FmmError::io(format!("Failed to read {}", path.display()), e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| FmmError::JsonParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Write the document with entries sorted by name
    pub fn write(&self, path: &Path) -> RegistryResult<()> {
        let mut sorted = self.clone();
        sorted.mods.sort_by(|a, b| a.name.cmp(&b.name));

        let mut content = serde_json::to_string_pretty(&sorted).map_err(|e| FmmError::JsonParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        content.push('\n');

        write_atomic(path, content.as_bytes())
    }
}
