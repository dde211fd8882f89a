//! Dependency resolution for fmm
//!
//! This crate expands a requested set of mods into its transitive closure of
//! required dependencies. Releases are looked up through the [`Catalog`]
//! capability, which is implemented by the local registry and the mod portal
//! and chained with [`Fallback`] so the portal is only asked for what is
//! missing locally.

pub mod catalog;
pub mod resolve;

// Re-export main types
pub use catalog::{Catalog, Fallback, LocalCatalog};
pub use resolve::{Conflict, Resolution, Resolver};

use fmm_core::error::FmmError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, FmmError>;
