use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use filetime::FileTime;
use log::warn;

use super::{
    FileInfo, NativeDirectoryQuery, NativeEntry, NativeError, NativeResult,
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_READONLY,
    FILE_ATTRIBUTE_REPARSE_POINT,
};
use crate::config::FsConfig;
use crate::path_key::PathKey;

/// Directory query backed by the host filesystem through `std::fs`.
#[derive(Debug, Clone)]
pub struct RealDirectoryQuery {
    enabled: bool,
}

impl RealDirectoryQuery {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn with_config(config: &FsConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }
}

impl Default for RealDirectoryQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeDirectoryQuery for RealDirectoryQuery {
    fn is_available(&self) -> bool {
        self.enabled
    }

    fn query_directory(&self, dir: &PathKey) -> NativeResult<Vec<NativeEntry>> {
        let native = dir.to_native_path();
        let entries = fs::read_dir(&native).map_err(|e| map_io_error(&native, e))?;

        let mut results = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir, e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            // Follow symlinks, but keep broken ones visible as reparse points
            let (metadata, is_link) = match fs::metadata(&path) {
                Ok(m) => {
                    let is_link = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);
                    (m, is_link)
                }
                Err(_) => match fs::symlink_metadata(&path) {
                    Ok(m) => (m, true),
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                },
            };

            let info = file_info(&name, &metadata, is_link);
            results.push(NativeEntry { name, info });
        }

        Ok(results)
    }

    fn query_info(&self, path: &PathKey) -> NativeResult<FileInfo> {
        let native = path.to_native_path();
        let metadata = fs::metadata(&native).map_err(|e| map_io_error(&native, e))?;
        let name = path.file_name().unwrap_or_default();
        Ok(file_info(name, &metadata, false))
    }
}

fn map_io_error(path: &Path, error: io::Error) -> NativeError {
    match error.kind() {
        io::ErrorKind::NotFound => NativeError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => NativeError::AccessDenied(path.to_path_buf()),
        _ => NativeError::Io(error),
    }
}

fn file_info(name: &str, metadata: &Metadata, is_link: bool) -> FileInfo {
    let mut attributes = platform_attributes(name, metadata);
    if metadata.is_dir() {
        attributes |= FILE_ATTRIBUTE_DIRECTORY;
    }
    if metadata.permissions().readonly() {
        attributes |= FILE_ATTRIBUTE_READONLY;
    }
    if is_link {
        attributes |= FILE_ATTRIBUTE_REPARSE_POINT;
    }

    let length = if metadata.is_dir() { 0 } else { metadata.len() };
    let modified = FileTime::from_last_modification_time(metadata);
    let timestamp = modified.unix_seconds() * 1000 + i64::from(modified.nanoseconds() / 1_000_000);

    FileInfo::new(attributes, length, timestamp)
}

#[cfg(windows)]
fn platform_attributes(_name: &str, metadata: &Metadata) -> u32 {
    use std::os::windows::fs::MetadataExt;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN
}

#[cfg(not(windows))]
fn platform_attributes(name: &str, _metadata: &Metadata) -> u32 {
    if name.starts_with('.') {
        FILE_ATTRIBUTE_HIDDEN
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseSensitivity;
    use tempfile::TempDir;

    fn key(path: &Path) -> PathKey {
        PathKey::with_case(path, CaseSensitivity::Sensitive).unwrap()
    }

    #[test]
    fn test_lists_children_with_metadata() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"0123456789").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let query = RealDirectoryQuery::new();
        let mut entries = query.query_directory(&key(temp.path())).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].info.length, 10);
        assert!(!entries[0].info.is_directory());
        assert_eq!(entries[1].name, "sub");
        assert!(entries[1].info.is_directory());
    }

    #[test]
    fn test_timestamp_in_milliseconds() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("stamped.txt");
        fs::write(&file, b"x").unwrap();
        filetime::set_file_mtime(&file, FileTime::from_unix_time(1_700_000_000, 250_000_000)).unwrap();

        let info = RealDirectoryQuery::new().query_info(&key(&file)).unwrap();
        assert_eq!(info.timestamp, 1_700_000_000_250);
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let result = RealDirectoryQuery::new().query_directory(&key(&missing));
        assert!(matches!(result, Err(NativeError::NotFound(_))));
    }

    #[test]
    fn test_disabled_by_config() {
        let config = FsConfig {
            enabled: false,
            ..FsConfig::default()
        };
        assert!(!RealDirectoryQuery::with_config(&config).is_available());
        assert!(RealDirectoryQuery::new().is_available());
    }
}
