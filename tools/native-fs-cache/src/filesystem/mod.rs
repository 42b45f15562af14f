mod links;
mod native;

pub use links::{FsLinkResolver, LinkResolver};
pub use native::NativeLocalFileSystem;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_TIMESTAMP: i64 = 0;
pub const DEFAULT_LENGTH: u64 = 0;

pub const BA_EXISTS: u32 = 0x01;
pub const BA_REGULAR: u32 = 0x02;
pub const BA_DIRECTORY: u32 = 0x04;
pub const BA_HIDDEN: u32 = 0x08;
// Symlink or other reparse point
pub const BA_SYMLINK: u32 = 0x10;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("Native filesystem is not available")]
    NativeUnavailable,

    #[error("Operation not supported by this filesystem: {operation}")]
    Unsupported { operation: &'static str },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, FsError>;

/// A registered file-watch root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchRequest {
    pub root: PathBuf,
    pub recursive: bool,
}

/// Read-only local filesystem surface shared by all backends.
///
/// Metadata queries never fail: a path that cannot be resolved reads as
/// absent (`false`, empty, or the `DEFAULT_*` value). Only watch management
/// returns errors, so callers can fall back to another backend.
pub trait LocalFileSystem {
    fn list(&mut self, path: &Path) -> Vec<String>;

    fn exists(&mut self, path: &Path) -> bool;

    fn is_directory(&mut self, path: &Path) -> bool;

    fn is_writable(&mut self, path: &Path) -> bool;

    /// Modification time in milliseconds, or `DEFAULT_TIMESTAMP`.
    fn timestamp(&mut self, path: &Path) -> i64;

    /// Length in bytes, or `DEFAULT_LENGTH`.
    fn length(&mut self, path: &Path) -> u64;

    /// `BA_*` bits of `flags` that hold for `path`.
    fn boolean_attributes(&mut self, path: &Path, flags: u32) -> u32;

    fn add_roots_to_watch(&mut self, roots: &[PathBuf], recursive: bool) -> Result<Vec<WatchRequest>>;

    fn remove_watched_roots(&mut self, requests: &[WatchRequest]) -> Result<()>;

    fn replace_watched_roots(
        &mut self,
        requests: &[WatchRequest],
        recursive_roots: Option<&[PathBuf]>,
        flat_roots: Option<&[PathBuf]>,
    ) -> Result<Vec<WatchRequest>>;
}
