//! Mod portal client for fmm
//!
//! This crate provides HTTP client functionality for fetching mod metadata and
//! downloading release archives from the mod portal, with retry logic and
//! sha1 checksum verification.

pub mod api;
pub mod client;

// Re-export main types
pub use api::{ModPortalResult, PortalInfoJson, PortalRelease};
pub use client::{Credentials, PortalClient, RetryConfig};
pub use fmm_core::DEFAULT_PORTAL_URL;

use fmm_core::error::FmmError;

/// Result type for portal operations
pub type PortalResult<T> = Result<T, FmmError>;
