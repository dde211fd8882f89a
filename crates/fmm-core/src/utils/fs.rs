//! Filesystem helpers.

use crate::error::{FmmError, FmmResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `contents` in one step
///
/// The data is written to a temporary file in the same directory and renamed
/// over the target, so readers see either the old or the new file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> FmmResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| {
        FmmError::io(format!("Failed to create temp file in {}", dir.display()), e)
    })?;

    temp.write_all(contents)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| FmmError::io(format!("Failed to write {}", path.display()), e))?;

    temp.persist(path)
        .map_err(|e| FmmError::io(format!("Failed to replace {}", path.display()), e.error))?;

    Ok(())
}

/// Check whether a directory entry name is hidden (dot-prefixed)
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
