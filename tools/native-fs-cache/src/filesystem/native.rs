use std::path::{Path, PathBuf};
use log::debug;

use super::{
    FsError, LinkResolver, LocalFileSystem, Result, WatchRequest, DEFAULT_LENGTH,
    DEFAULT_TIMESTAMP,
};
use crate::cache::{CacheStats, MetadataCache};
use crate::config::CaseSensitivity;
use crate::native::{FileInfo, NativeDirectoryQuery};
use crate::path_key::PathKey;

/// `LocalFileSystem` served from a per-worker `MetadataCache`.
///
/// Instances are handed out by `WorkerFs::acquire`, which clears the cache
/// on every acquisition.
pub struct NativeLocalFileSystem<Q: NativeDirectoryQuery, L: LinkResolver> {
    cache: MetadataCache<Q>,
    links: L,
    case: CaseSensitivity,
}

impl<Q: NativeDirectoryQuery, L: LinkResolver> NativeLocalFileSystem<Q, L> {
    pub(crate) fn new(query: Q, links: L, case: CaseSensitivity) -> Self {
        Self {
            cache: MetadataCache::new(query),
            links,
            case,
        }
    }

    pub fn cache(&self) -> &MetadataCache<Q> {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut MetadataCache<Q> {
        &mut self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn key(&self, path: &Path) -> Option<PathKey> {
        match PathKey::with_case(path, self.case) {
            Ok(key) => Some(key),
            Err(e) => {
                debug!("Treating as absent: {}", e);
                None
            }
        }
    }

    fn info(&mut self, path: &Path) -> Option<FileInfo> {
        let key = self.key(path)?;
        self.cache.get_info(&key)
    }
}

impl<Q: NativeDirectoryQuery, L: LinkResolver> LocalFileSystem for NativeLocalFileSystem<Q, L> {
    fn list(&mut self, path: &Path) -> Vec<String> {
        if self.links.is_invalid_symlink(path) {
            debug!("Not listing invalid symlink: {}", path.display());
            return Vec::new();
        }

        match self.key(path) {
            Some(key) => self.cache.list(&key),
            None => Vec::new(),
        }
    }

    fn exists(&mut self, path: &Path) -> bool {
        let key = match self.key(path) {
            Some(key) => key,
            None => return false,
        };
        if key.is_root() {
            return true;
        }
        self.cache.get_info(&key).is_some()
    }

    fn is_directory(&mut self, path: &Path) -> bool {
        self.info(path).map_or(false, |info| info.is_directory())
    }

    fn is_writable(&mut self, path: &Path) -> bool {
        self.info(path).map_or(false, |info| !info.is_readonly())
    }

    fn timestamp(&mut self, path: &Path) -> i64 {
        self.info(path).map_or(DEFAULT_TIMESTAMP, |info| info.timestamp)
    }

    fn length(&mut self, path: &Path) -> u64 {
        self.info(path).map_or(DEFAULT_LENGTH, |info| info.length)
    }

    fn boolean_attributes(&mut self, path: &Path, flags: u32) -> u32 {
        match self.key(path) {
            Some(key) => self.cache.boolean_attributes(&key, flags),
            None => 0,
        }
    }

    fn add_roots_to_watch(&mut self, _roots: &[PathBuf], _recursive: bool) -> Result<Vec<WatchRequest>> {
        Err(FsError::Unsupported {
            operation: "add_roots_to_watch",
        })
    }

    fn remove_watched_roots(&mut self, _requests: &[WatchRequest]) -> Result<()> {
        Err(FsError::Unsupported {
            operation: "remove_watched_roots",
        })
    }

    fn replace_watched_roots(
        &mut self,
        _requests: &[WatchRequest],
        _recursive_roots: Option<&[PathBuf]>,
        _flat_roots: Option<&[PathBuf]>,
    ) -> Result<Vec<WatchRequest>> {
        Err(FsError::Unsupported {
            operation: "replace_watched_roots",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDirectoryQuery, MockLinkResolver};
    use crate::native::FILE_ATTRIBUTE_READONLY;

    fn filesystem(query: &MockDirectoryQuery) -> NativeLocalFileSystem<MockDirectoryQuery, MockLinkResolver> {
        NativeLocalFileSystem::new(query.clone(), MockLinkResolver::new(), CaseSensitivity::Sensitive)
    }

    #[test]
    fn test_readonly_file_is_not_writable() {
        let query = MockDirectoryQuery::new();
        query.add_directory("/d", 0);
        query.add_file("/d/locked", FileInfo::file(1, 0).with_attributes(FILE_ATTRIBUTE_READONLY));

        let mut fs = filesystem(&query);
        assert!(fs.exists(Path::new("/d/locked")));
        assert!(!fs.is_writable(Path::new("/d/locked")));
        assert!(fs.is_writable(Path::new("/d")));
    }

    #[test]
    fn test_relative_path_reads_as_absent() {
        let query = MockDirectoryQuery::new();
        let mut fs = filesystem(&query);

        assert!(!fs.exists(Path::new("relative/path")));
        assert!(fs.list(Path::new("relative")).is_empty());
        assert_eq!(fs.length(Path::new("relative/path")), DEFAULT_LENGTH);
        assert_eq!(query.call_count(), 0);
    }

    #[test]
    fn test_access_denied_reads_as_absent() {
        let query = MockDirectoryQuery::new();
        query.add_directory("/secret", 0);
        query.add_file("/secret/key", FileInfo::file(32, 0));
        query.deny("/secret");

        let mut fs = filesystem(&query);
        assert!(fs.list(Path::new("/secret")).is_empty());
        assert!(!fs.exists(Path::new("/secret/key")));
        assert_eq!(fs.timestamp(Path::new("/secret/key")), DEFAULT_TIMESTAMP);
    }
}
