//! Local mod registry for fmm
//!
//! This crate scans the game's data directory and the user's mods directory,
//! reads each release's `info.json` from zip archives or unpacked directories,
//! and tracks which release of every mod is enabled through `mod-list.json`.

pub mod archive;
pub mod mod_list;
pub mod registry;

// Re-export main types
pub use archive::{read_release, InfoJson};
pub use mod_list::{ModListEntry, ModListJson, MOD_LIST_FILE};
pub use registry::{PackageSources, Registry, RegistryOptions};

use fmm_core::error::FmmError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, FmmError>;
