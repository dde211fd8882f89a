//! Release archive reader.
//!
//! Reads `info.json` from a zip archive (`<top>/info.json`) or an unpacked
//! directory (`<dir>/info.json`) and checks it against the artifact's name.

use crate::RegistryResult;
use fmm_core::types::archive_name;
use fmm_core::{Dependency, FmmError, Release, Source, Version};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};
use tracing::debug;
use zip::ZipArchive;

const INFO_JSON: &str = "info.json";

/// The fields of `info.json` the registry cares about
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfoJson {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// Read a release from a zip archive or a directory
pub fn read_release(path: &Path) -> RegistryResult<Release> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let metadata = std::fs::metadata(path)
        .map_err(|e| FmmError::io(format!("Failed to stat {}", path.display()), e))?;

    let (info, source) = if metadata.is_dir() {
        let info = read_dir_info(path)?;
        check_dir_name(&file_name, &info)?;
        (info, Source::Directory(path.to_path_buf()))
    } else {
        let info = read_zip_info(path)?;
        check_archive_name(&file_name, &info)?;
        (info, Source::Archive(path.to_path_buf()))
    };

    debug!("Read {} {} from {}", info.name, info.version, path.display());

    Ok(Release {
        name: info.name,
        version: info.version,
        dependencies: info.dependencies,
        source,
    })
}

fn read_dir_info(dir: &Path) -> RegistryResult<InfoJson> {
    let info_path = dir.join(INFO_JSON);
    let content = std::fs::read_to_string(&info_path)
        .map_err(|e| FmmError::info_json(dir, "missing or unreadable info.json", e))?;

    parse_info(dir, &content)
}

fn read_zip_info(path: &Path) -> RegistryResult<InfoJson> {
    let file = File::open(path)
        .map_err(|e| FmmError::io(format!("Failed to open archive {}", path.display()), e))?;

    let mut archive =
        ZipArchive::new(file).map_err(|e| FmmError::info_json(path, "unreadable zip archive", e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| FmmError::info_json(path, format!("unreadable zip entry {}", i), e))?;

        let Some(entry_path) = entry.enclosed_name() else {
            debug!("Skipping entry with invalid path in {}", path.display());
            continue;
        };

        if !is_top_level_info(&entry_path) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| FmmError::info_json(path, "unreadable info.json", e))?;

        return parse_info(path, &content);
    }

    Err(FmmError::InfoJson {
        path: path.to_path_buf(),
        message: "archive has no <top>/info.json".to_string(),
        source: None,
    })
}

/// `info.json` exactly one directory below the archive root
fn is_top_level_info(entry_path: &Path) -> bool {
    let parts: Vec<_> = entry_path.components().collect();
    matches!(
        parts.as_slice(),
        [Component::Normal(_), Component::Normal(file)] if *file == INFO_JSON
    )
}

fn parse_info(path: &Path, content: &str) -> RegistryResult<InfoJson> {
    serde_json::from_str(content).map_err(|e| FmmError::info_json(path, "malformed info.json", e))
}

fn check_archive_name(file_name: &str, info: &InfoJson) -> RegistryResult<()> {
    let expected = archive_name(&info.name, &info.version);

    if file_name == expected {
        Ok(())
    } else {
        Err(FmmError::FilenameMismatch {
            expected,
            actual: file_name.to_string(),
        })
    }
}

fn check_dir_name(dir_name: &str, info: &InfoJson) -> RegistryResult<()> {
    if dir_name == info.name {
        Ok(())
    } else {
        Err(FmmError::FilenameMismatch {
            expected: info.name.clone(),
            actual: dir_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmm_core::DependencyKind;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn create_zip(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }

    #[test]
    fn test_read_zip_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo_1.0.0.zip");
        create_zip(
            &path,
            &[
                ("foo_1.0.0/data.lua", "-- data"),
                (
                    "foo_1.0.0/info.json",
                    r#"{"name": "foo", "version": "1.0.0", "dependencies": ["base >= 1.1", "? bar"]}"#,
                ),
            ],
        );

        let release = read_release(&path).unwrap();
        assert_eq!(release.name, "foo");
        assert_eq!(release.version, Version::new(1, 0, 0));
        assert_eq!(release.dependencies.len(), 2);
        assert_eq!(release.dependencies[1].kind, DependencyKind::Optional);
        assert_eq!(release.source, Source::Archive(path));
    }

    #[test]
    fn test_nested_info_json_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo_1.0.0.zip");
        create_zip(
            &path,
            &[
                ("info.json", r#"{"name": "foo", "version": "1.0.0"}"#),
                ("foo/nested/info.json", r#"{"name": "foo", "version": "1.0.0"}"#),
            ],
        );

        let err = read_release(&path).unwrap_err();
        assert!(matches!(err, FmmError::InfoJson { .. }));
    }

    #[test]
    fn test_archive_name_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo_1.0.0.zip");
        create_zip(
            &path,
            &[("foo/info.json", r#"{"name": "foo", "version": "1.1.0"}"#)],
        );

        match read_release(&path).unwrap_err() {
            FmmError::FilenameMismatch { expected, actual } => {
                assert_eq!(expected, "foo_1.1.0.zip");
                assert_eq!(actual, "foo_1.0.0.zip");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_archive_name_must_match_exactly() {
        let dir = tempdir().unwrap();

        for file_name in ["foo_01.0.zip", "foo_1.0.zip", "foo_1.0.0.0.zip"] {
            let path = dir.path().join(file_name);
            create_zip(
                &path,
                &[("foo/info.json", r#"{"name": "foo", "version": "1.0.0"}"#)],
            );

            match read_release(&path).unwrap_err() {
                FmmError::FilenameMismatch { expected, actual } => {
                    assert_eq!(expected, "foo_1.0.0.zip");
                    assert_eq!(actual, file_name);
                },
                other => panic!("unexpected error for {file_name}: {other}"),
            }
        }
    }

    #[test]
    fn test_read_directory_release() {
        let dir = tempdir().unwrap();
        let mod_dir = dir.path().join("bar");
        std::fs::create_dir(&mod_dir).unwrap();
        std::fs::write(
            mod_dir.join("info.json"),
            r#"{"name": "bar", "version": "0.3.1", "title": "Bar"}"#,
        )
        .unwrap();

        let release = read_release(&mod_dir).unwrap();
        assert_eq!(release.name, "bar");
        assert_eq!(release.version, Version::new(0, 3, 1));
        assert!(release.dependencies.is_empty());
        assert_eq!(release.source, Source::Directory(mod_dir));
    }

    #[test]
    fn test_directory_name_mismatch() {
        let dir = tempdir().unwrap();
        let mod_dir = dir.path().join("bar_0.3.1");
        std::fs::create_dir(&mod_dir).unwrap();
        std::fs::write(
            mod_dir.join("info.json"),
            r#"{"name": "bar", "version": "0.3.1"}"#,
        )
        .unwrap();

        let err = read_release(&mod_dir).unwrap_err();
        assert!(matches!(err, FmmError::FilenameMismatch { .. }));
    }

    #[test]
    fn test_malformed_info_json() {
        let dir = tempdir().unwrap();
        let mod_dir = dir.path().join("bad");
        std::fs::create_dir(&mod_dir).unwrap();
        std::fs::write(mod_dir.join("info.json"), r#"{"name": "bad", "version": "x"}"#).unwrap();

        let err = read_release(&mod_dir).unwrap_err();
        assert!(matches!(err, FmmError::InfoJson { .. }));
    }
}
