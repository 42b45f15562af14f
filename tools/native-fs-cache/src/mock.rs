use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::CaseSensitivity;
use crate::filesystem::LinkResolver;
use crate::native::{FileInfo, NativeDirectoryQuery, NativeEntry, NativeError, NativeResult};
use crate::path_key::PathKey;

/// In-memory native layer that records every call made to it.
///
/// Clones share state, so a test can keep one handle while the cache owns another.
#[derive(Debug, Clone)]
pub struct MockDirectoryQuery {
    entries: Arc<Mutex<HashMap<String, FileInfo>>>,
    denied: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
    info_calls: Arc<Mutex<Vec<String>>>,
    available: Arc<AtomicBool>,
}

impl MockDirectoryQuery {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            denied: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            info_calls: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn add_file(&self, path: &str, info: FileInfo) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(normalize(path), info);
    }

    pub fn add_directory(&self, path: &str, timestamp: i64) {
        self.add_file(path, FileInfo::directory(timestamp));
    }

    pub fn remove(&self, path: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(&normalize(path));
    }

    /// Makes every native query of `path` fail with `AccessDenied`.
    pub fn deny(&self, path: &str) {
        let mut denied = self.denied.lock().unwrap();
        denied.insert(normalize(path));
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Directories listed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Paths passed to the single-path query, in call order.
    pub fn info_calls(&self) -> Vec<String> {
        self.info_calls.lock().unwrap().clone()
    }
}

impl Default for MockDirectoryQuery {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &str) -> String {
    PathKey::with_case(path, CaseSensitivity::Sensitive)
        .map(|key| key.as_str().to_string())
        .unwrap_or_else(|_| path.to_string())
}

impl NativeDirectoryQuery for MockDirectoryQuery {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn query_directory(&self, dir: &PathKey) -> NativeResult<Vec<NativeEntry>> {
        self.calls.lock().unwrap().push(dir.as_str().to_string());

        if self.denied.lock().unwrap().contains(dir.as_str()) {
            return Err(NativeError::AccessDenied(dir.as_path().to_path_buf()));
        }

        let entries = self.entries.lock().unwrap();
        let is_directory = dir.is_root()
            || entries
                .get(dir.as_str())
                .map_or(false, |info| info.is_directory());
        if !is_directory {
            return Err(NativeError::NotFound(dir.as_path().to_path_buf()));
        }

        let mut results = Vec::new();
        for (path, info) in entries.iter() {
            let key = match PathKey::with_case(path, dir.case_sensitivity()) {
                Ok(key) => key,
                Err(_) => continue,
            };
            if key.parent().as_ref() == Some(dir) {
                if let Some(name) = key.file_name() {
                    results.push(NativeEntry::new(name, *info));
                }
            }
        }
        results.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(results)
    }

    fn query_info(&self, path: &PathKey) -> NativeResult<FileInfo> {
        self.info_calls.lock().unwrap().push(path.as_str().to_string());

        if self.denied.lock().unwrap().contains(path.as_str()) {
            return Err(NativeError::AccessDenied(path.as_path().to_path_buf()));
        }

        if path.is_root() {
            return Ok(FileInfo::directory(0));
        }
        let entries = self.entries.lock().unwrap();
        entries
            .get(path.as_str())
            .copied()
            .ok_or_else(|| NativeError::NotFound(path.as_path().to_path_buf()))
    }
}

/// Link resolver that reports a fixed set of paths as invalid links.
#[derive(Debug, Clone, Default)]
pub struct MockLinkResolver {
    invalid: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockLinkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_invalid_link(&self, path: impl Into<PathBuf>) {
        self.invalid.lock().unwrap().insert(path.into());
    }
}

impl LinkResolver for MockLinkResolver {
    fn is_invalid_symlink(&self, path: &Path) -> bool {
        self.invalid.lock().unwrap().contains(path)
    }
}
