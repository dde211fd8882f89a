//! Error types and result aliases for fmm operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the fmm workspace with actionable error messages.

use crate::types::VersionError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all fmm operations
#[derive(Error, Debug)]
pub enum FmmError {
    // Validation errors
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error("Invalid dependency '{input}': {reason}")]
    InvalidDependency { input: String, reason: String },

    #[error("Invalid mod identifier '{input}': {reason}")]
    InvalidIdent { input: String, reason: String },

    #[error("'{actual}' does not match its info.json, expected '{expected}'")]
    FilenameMismatch { expected: String, actual: String },

    #[error("Failed to read info.json from {}: {message}", path.display())]
    InfoJson {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to load {}", artifact.display())]
    Load {
        artifact: PathBuf,
        #[source]
        source: Box<FmmError>,
    },

    #[error("Malformed portal response for '{name}': {message}")]
    PortalResponse { name: String, message: String },

    #[error("Integrity check failed for {package}: expected {expected}, got {actual}")]
    IntegrityFailure {
        package: String,
        expected: String,
        actual: String,
    },

    // Lookup errors
    #[error("Mod '{name}' not found")]
    PackageNotFound { name: String },

    #[error("No release of '{name}' matches {requirement}")]
    NoMatchingRelease { name: String, requirement: String },

    // State errors
    #[error("Mod '{name}' is already disabled")]
    AlreadyDisabled { name: String },

    #[error("Mod '{name}' ships with the game and cannot be removed")]
    InternalPackage { name: String },

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Downloading '{name}' requires portal credentials")]
    MissingCredentials { name: String },

    // Config errors
    #[error("'{}' is not a game directory", path.display())]
    InvalidGameDir { path: PathBuf },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Failed to parse fmm.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    JsonParse { path: PathBuf, message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    // Aggregate
    #[error("Failed to resolve {}", ResolutionFailures(failures))]
    Resolution { failures: Vec<(String, FmmError)> },
}

/// Result type alias for fmm operations
pub type FmmResult<T> = Result<T, FmmError>;

/// Coarse classification of [`FmmError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    State,
    Network,
    Auth,
    Config,
    Io,
    Aggregate,
}

struct ResolutionFailures<'a>(&'a [(String, FmmError)]);

impl fmt::Display for ResolutionFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, error)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}' ({})", name, error)?;
        }
        Ok(())
    }
}

impl FmmError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create an info.json error with an underlying cause
    pub fn info_json<E>(path: impl Into<PathBuf>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InfoJson {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap an error with the artifact that caused it
    pub fn load(artifact: impl Into<PathBuf>, source: FmmError) -> Self {
        Self::Load {
            artifact: artifact.into(),
            source: Box::new(source),
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            FmmError::InvalidVersion(_)
            | FmmError::InvalidDependency { .. }
            | FmmError::InvalidIdent { .. }
            | FmmError::FilenameMismatch { .. }
            | FmmError::InfoJson { .. }
            | FmmError::Load { .. }
            | FmmError::PortalResponse { .. }
            | FmmError::IntegrityFailure { .. } => ErrorCategory::Validation,
            FmmError::PackageNotFound { .. } | FmmError::NoMatchingRelease { .. } => {
                ErrorCategory::NotFound
            },
            FmmError::AlreadyDisabled { .. } | FmmError::InternalPackage { .. } => {
                ErrorCategory::State
            },
            FmmError::Network { .. } => ErrorCategory::Network,
            FmmError::Auth { .. } | FmmError::MissingCredentials { .. } => ErrorCategory::Auth,
            FmmError::InvalidGameDir { .. }
            | FmmError::ConfigValidation { .. }
            | FmmError::TomlParse { .. }
            | FmmError::JsonParse { .. } => ErrorCategory::Config,
            FmmError::Io { .. } => ErrorCategory::Io,
            FmmError::Resolution { .. } => ErrorCategory::Aggregate,
        }
    }

    /// Check if this error is a "not found" lookup failure
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors are reported per mod and the run continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::NotFound
                | ErrorCategory::State
                | ErrorCategory::Network
                | ErrorCategory::Auth
                | ErrorCategory::Aggregate
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            FmmError::PackageNotFound { .. } => {
                Some("Check the mod name spelling; names are case sensitive")
            },
            FmmError::NoMatchingRelease { .. } => {
                Some("Run 'fmm list' to see the installed releases")
            },
            FmmError::Network { .. } => Some("Check your internet connection and try again"),
            FmmError::Auth { .. } | FmmError::MissingCredentials { .. } => Some(
                "Set FMM_USERNAME and FMM_TOKEN, or log in to the game once to create player-data.json",
            ),
            FmmError::InvalidGameDir { .. } => {
                Some("Pass --game-dir pointing at the directory that contains config-path.cfg")
            },
            FmmError::FilenameMismatch { .. } => {
                Some("Rename the archive to '<name>_<version>.zip' or the directory to '<name>'")
            },
            FmmError::IntegrityFailure { .. } => Some("Delete the partial download and retry"),
            _ => None,
        }
    }
}
