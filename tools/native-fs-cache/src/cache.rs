use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use log::{debug, trace};

use crate::filesystem::{BA_DIRECTORY, BA_EXISTS, BA_HIDDEN, BA_REGULAR, BA_SYMLINK};
use crate::native::{FileInfo, NativeDirectoryQuery, NativeEntry};
use crate::path_key::PathKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub native_calls: u64,
}

/// Metadata cache owned by a single worker. Entries stay authoritative until
/// the next `clear_cache`.
pub struct MetadataCache<Q: NativeDirectoryQuery> {
    query: Q,
    infos: HashMap<PathKey, FileInfo>,
    children: HashMap<PathKey, Vec<String>>,
    // Roots the native layer could not resolve
    absent: HashSet<PathKey>,
    stats: CacheStats,
}

impl<Q: NativeDirectoryQuery> MetadataCache<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            infos: HashMap::new(),
            children: HashMap::new(),
            absent: HashSet::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty() && self.children.is_empty() && self.absent.is_empty()
    }

    pub fn clear_cache(&mut self) {
        debug!(
            "Clearing metadata cache ({} entries, {} listings)",
            self.infos.len(),
            self.children.len()
        );
        self.infos.clear();
        self.children.clear();
        self.absent.clear();
        self.stats = CacheStats::default();
    }

    pub fn get_info(&mut self, path: &PathKey) -> Option<FileInfo> {
        if let Some(info) = self.infos.get(path) {
            trace!("Cache hit: {}", path);
            self.stats.hits += 1;
            return Some(*info);
        }

        let parent = match path.parent() {
            Some(parent) => parent,
            None if self.absent.contains(path) => {
                trace!("Negative hit for root: {}", path);
                self.stats.hits += 1;
                return None;
            }
            None => return self.fetch_root(path),
        };

        // The parent listing is authoritative for this epoch
        if self.children.contains_key(&parent) {
            trace!("Negative hit from cached listing: {}", path);
            self.stats.hits += 1;
            return None;
        }

        self.stats.misses += 1;
        self.fetch_listing(&parent);
        self.infos.get(path).copied()
    }

    pub fn list(&mut self, path: &PathKey) -> Vec<String> {
        if let Some(names) = self.children.get(path) {
            trace!("Listing cache hit: {}", path);
            self.stats.hits += 1;
            return names.clone();
        }

        self.stats.misses += 1;
        self.fetch_listing(path).to_vec()
    }

    pub fn boolean_attributes(&mut self, path: &PathKey, flags: u32) -> u32 {
        let info = match self.get_info(path) {
            Some(info) => info,
            None => return 0,
        };

        let mut result = 0;
        if flags & BA_EXISTS != 0 {
            result |= BA_EXISTS;
        }
        if flags & BA_DIRECTORY != 0 && info.is_directory() {
            result |= BA_DIRECTORY;
        }
        if flags & BA_REGULAR != 0 && !info.is_directory() {
            result |= BA_REGULAR;
        }
        if flags & BA_HIDDEN != 0 && info.is_hidden() {
            result |= BA_HIDDEN;
        }
        if flags & BA_SYMLINK != 0 && info.is_reparse_point() {
            result |= BA_SYMLINK;
        }
        result
    }

    // One native round-trip caches the names and every child's metadata.
    // A failed listing is cached as empty.
    fn fetch_listing(&mut self, dir: &PathKey) -> &[String] {
        self.stats.native_calls += 1;
        let entries = match self.query.query_directory(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Native listing failed for {}: {}", dir, e);
                Vec::new()
            }
        };
        debug!("Native listing of {}: {} entries", dir, entries.len());

        let mut names = Vec::with_capacity(entries.len());
        for NativeEntry { name, info } in entries {
            match self.infos.entry(dir.child(&name)) {
                Entry::Vacant(slot) => {
                    slot.insert(info);
                }
                // Only possible when names differ by case under an insensitive policy
                Entry::Occupied(_) => {
                    debug!("Case collision in {}: keeping first entry, ignoring {}", dir, name);
                }
            }
            names.push(name);
        }

        self.children.entry(dir.clone()).or_insert(names)
    }

    fn fetch_root(&mut self, root: &PathKey) -> Option<FileInfo> {
        self.stats.misses += 1;
        self.stats.native_calls += 1;
        match self.query.query_info(root) {
            Ok(info) => {
                self.infos.insert(root.clone(), info);
                Some(info)
            }
            Err(e) => {
                debug!("Native query failed for root {}: {}", root, e);
                self.absent.insert(root.clone());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseSensitivity;
    use crate::mock::MockDirectoryQuery;
    use crate::native::FILE_ATTRIBUTE_REPARSE_POINT;

    fn key(path: &str) -> PathKey {
        PathKey::with_case(path, CaseSensitivity::Sensitive).unwrap()
    }

    fn sample_query() -> MockDirectoryQuery {
        let query = MockDirectoryQuery::new();
        query.add_directory("/d", 100);
        query.add_file("/d/a.txt", FileInfo::file(10, 1_000));
        query.add_file("/d/b.txt", FileInfo::file(20, 2_000));
        query
    }

    #[test]
    fn test_miss_lists_parent_once() {
        let query = sample_query();
        let mut cache = MetadataCache::new(query.clone());

        let info = cache.get_info(&key("/d/a.txt")).unwrap();
        assert_eq!(info.length, 10);
        assert_eq!(query.calls(), vec!["/d".to_string()]);

        // Sibling came with the same listing
        assert_eq!(cache.get_info(&key("/d/b.txt")).unwrap().length, 20);
        assert_eq!(query.call_count(), 1);
        assert_eq!(cache.stats().native_calls, 1);
    }

    #[test]
    fn test_missing_sibling_uses_cached_listing() {
        let query = sample_query();
        let mut cache = MetadataCache::new(query.clone());

        assert_eq!(cache.list(&key("/d")).len(), 2);
        assert!(cache.get_info(&key("/d/nope.txt")).is_none());
        assert_eq!(query.call_count(), 1);
    }

    #[test]
    fn test_failed_listing_is_cached_as_empty() {
        let query = sample_query();
        let mut cache = MetadataCache::new(query.clone());

        assert!(cache.list(&key("/gone")).is_empty());
        assert!(cache.list(&key("/gone")).is_empty());
        assert!(cache.get_info(&key("/gone/file")).is_none());
        assert_eq!(query.call_count(), 1);
    }

    #[test]
    fn test_root_uses_single_path_query() {
        let query = sample_query();
        let mut cache = MetadataCache::new(query.clone());

        let root = cache.get_info(&key("/")).unwrap();
        assert!(root.is_directory());
        assert_eq!(query.info_calls(), vec!["/".to_string()]);

        cache.get_info(&key("/"));
        assert_eq!(query.info_calls().len(), 1);
    }

    #[test]
    fn test_clear_resets_entries_and_stats() {
        let query = sample_query();
        let mut cache = MetadataCache::new(query.clone());

        cache.get_info(&key("/d/a.txt"));
        assert!(!cache.is_empty());

        cache.clear_cache();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());

        cache.get_info(&key("/d/a.txt"));
        assert_eq!(query.call_count(), 2);
    }

    #[test]
    fn test_boolean_attributes_masks_requested_bits() {
        let query = sample_query();
        let mut cache = MetadataCache::new(query);

        let all = BA_EXISTS | BA_REGULAR | BA_DIRECTORY | BA_HIDDEN;
        assert_eq!(cache.boolean_attributes(&key("/d/a.txt"), all), BA_EXISTS | BA_REGULAR);
        assert_eq!(cache.boolean_attributes(&key("/d"), all), BA_EXISTS | BA_DIRECTORY);
        assert_eq!(cache.boolean_attributes(&key("/d/a.txt"), BA_DIRECTORY), 0);
        assert_eq!(cache.boolean_attributes(&key("/d/missing"), all), 0);
    }

    #[test]
    fn test_failed_root_is_cached_as_absent() {
        let query = sample_query();
        query.deny("Z:/");
        let mut cache = MetadataCache::new(query.clone());

        for _ in 0..3 {
            assert!(cache.get_info(&key("Z:/")).is_none());
        }
        assert_eq!(query.info_calls(), vec!["Z:/".to_string()]);
        assert_eq!(cache.stats().native_calls, 1);
        assert_eq!(cache.stats().hits, 2);

        cache.clear_cache();
        assert!(cache.is_empty());
        assert!(cache.get_info(&key("Z:/")).is_none());
        assert_eq!(query.info_calls().len(), 2);
    }

    #[test]
    fn test_case_collision_keeps_first_entry() {
        let query = MockDirectoryQuery::new();
        query.add_directory("/d", 0);
        query.add_file("/d/A", FileInfo::file(1, 0));
        query.add_file("/d/a", FileInfo::file(2, 0));
        let mut cache = MetadataCache::new(query.clone());
        let insensitive = |path: &str| PathKey::with_case(path, CaseSensitivity::Insensitive).unwrap();

        // Both names are still listed, but only one entry can back them
        assert_eq!(cache.list(&insensitive("/d")), vec!["A", "a"]);
        assert_eq!(cache.get_info(&insensitive("/d/A")).unwrap().length, 1);
        assert_eq!(cache.get_info(&insensitive("/d/a")).unwrap().length, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(query.call_count(), 1);
    }

    #[test]
    fn test_reparse_point_reports_symlink_bit() {
        let query = sample_query();
        query.add_file("/d/link", FileInfo::file(0, 0).with_attributes(FILE_ATTRIBUTE_REPARSE_POINT));
        let mut cache = MetadataCache::new(query);

        assert_eq!(cache.boolean_attributes(&key("/d/link"), BA_SYMLINK), BA_SYMLINK);
        assert_eq!(cache.boolean_attributes(&key("/d/a.txt"), BA_SYMLINK), 0);
        assert_eq!(
            cache.boolean_attributes(&key("/d/link"), BA_EXISTS | BA_REGULAR | BA_SYMLINK),
            BA_EXISTS | BA_REGULAR | BA_SYMLINK
        );
    }
}
