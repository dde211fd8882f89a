//! Configuration loading for fmm
//!
//! This crate handles parsing and validation of `fmm.toml` and the game's
//! `player-data.json`, layering them with environment variables and command
//! line flags into one resolved [`Config`].

pub mod json;
pub mod merge;
pub mod toml;

// Re-export main types
pub use crate::json::PlayerData;
pub use crate::merge::{Config, ConfigLayering, ConfigLoader, ConfigSource};
pub use crate::toml::FmmToml;

use fmm_core::error::FmmError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, FmmError>;
