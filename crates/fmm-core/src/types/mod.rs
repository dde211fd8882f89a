//! Core data types for fmm.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Version types for dotted numeric mod versions
//! - Dependency specifications as written in info.json
//! - Mod identities, releases and packages

pub mod dependency;
pub mod ident;
pub mod package;
pub mod release;
pub mod version;

// Re-export all public types
pub use dependency::{Dependency, DependencyKind};
pub use ident::ModIdent;
pub use package::Package;
pub use release::{archive_name, Release, Source};
pub use version::{Op, Version, VersionError, VersionReq};
