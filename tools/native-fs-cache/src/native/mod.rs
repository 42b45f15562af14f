mod real;

pub use real::RealDirectoryQuery;

use std::path::PathBuf;
use thiserror::Error;

use crate::path_key::PathKey;

pub const FILE_ATTRIBUTE_READONLY: u32 = 0x0001;
pub const FILE_ATTRIBUTE_HIDDEN: u32 = 0x0002;
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x0010;
pub const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0400;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NativeResult<T> = std::result::Result<T, NativeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    // FILE_ATTRIBUTE_* bits
    pub attributes: u32,
    pub length: u64,
    // ms since the Unix epoch
    pub timestamp: i64,
}

impl FileInfo {
    pub fn new(attributes: u32, length: u64, timestamp: i64) -> Self {
        Self {
            attributes,
            length,
            timestamp,
        }
    }

    pub fn file(length: u64, timestamp: i64) -> Self {
        Self::new(0, length, timestamp)
    }

    pub fn directory(timestamp: i64) -> Self {
        Self::new(FILE_ATTRIBUTE_DIRECTORY, 0, timestamp)
    }

    pub fn with_attributes(mut self, attributes: u32) -> Self {
        self.attributes |= attributes;
        self
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & FILE_ATTRIBUTE_DIRECTORY != 0
    }

    pub fn is_readonly(&self) -> bool {
        self.attributes & FILE_ATTRIBUTE_READONLY != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes & FILE_ATTRIBUTE_HIDDEN != 0
    }

    pub fn is_reparse_point(&self) -> bool {
        self.attributes & FILE_ATTRIBUTE_REPARSE_POINT != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEntry {
    pub name: String,
    pub info: FileInfo,
}

impl NativeEntry {
    pub fn new(name: impl Into<String>, info: FileInfo) -> Self {
        Self {
            name: name.into(),
            info,
        }
    }
}

/// Synchronous OS-level metadata query. One `query_directory` call returns
/// every child's metadata.
pub trait NativeDirectoryQuery: Send {
    fn is_available(&self) -> bool {
        true
    }

    fn query_directory(&self, dir: &PathKey) -> NativeResult<Vec<NativeEntry>>;

    // Only used for roots, which have no parent to list
    fn query_info(&self, path: &PathKey) -> NativeResult<FileInfo>;
}
