//! Terminal output formatting.
//!
//! Commands print through [`OutputHandler`] so colors and error formatting
//! stay consistent.

pub mod colors;
pub mod errors;

use fmm_core::error::FmmError;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
    errors: errors::ErrorFormatter,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self::with_colors(colors::ColorSupport::detect())
    }

    pub fn with_colors(colors: colors::ColorSupport) -> Self {
        Self {
            errors: errors::ErrorFormatter::with_colors(colors),
            colors,
        }
    }

    /// Print a plain line
    pub fn print(&self, message: &str) {
        println!("{}", message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{}", self.errors.format_warning(message));
    }

    /// Print an error with its help line and cause chain
    pub fn error(&self, error: &FmmError) {
        eprintln!("{}", self.errors.format_error(error));
    }

    pub fn colors(&self) -> &colors::ColorSupport {
        &self.colors
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
