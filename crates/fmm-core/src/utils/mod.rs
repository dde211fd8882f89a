//! Utility functions and helpers.
//!
//! Common functionality used across multiple fmm crates.

pub mod fs;

// Re-export commonly used utilities
pub use fs::{is_hidden, write_atomic};
