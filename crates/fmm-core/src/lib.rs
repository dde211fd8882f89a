//! # fmm-core
//!
//! Core types and utilities shared across all fmm crates.
//!
//! This crate provides:
//! - Version and VersionReq types for mod versions and constraints
//! - Dependency, ModIdent, Release and Package types for mod management
//! - FmmError enum for unified error handling
//! - Utility functions for common filesystem operations
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Dependency, Package, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{ErrorCategory, FmmError, FmmResult};
pub use types::{
    Dependency, DependencyKind, ModIdent, Op, Package, Release, Source, Version, VersionError,
    VersionReq,
};

/// Name of the always-present package shipped with the game.
pub const BASE_PACKAGE: &str = "base";

/// Root of the public mod portal.
pub const DEFAULT_PORTAL_URL: &str = "https://mods.factorio.com";
