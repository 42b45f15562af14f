pub mod cache;
pub mod config;
pub mod filesystem;
pub mod native;
pub mod path_key;
pub mod worker;

pub mod mock;

pub use cache::{CacheStats, MetadataCache};
pub use config::{CaseSensitivity, FsConfig};
pub use filesystem::{FsError, FsLinkResolver, LinkResolver, LocalFileSystem, NativeLocalFileSystem};
pub use native::{FileInfo, NativeDirectoryQuery, NativeEntry, NativeError, RealDirectoryQuery};
pub use path_key::PathKey;
pub use worker::{FsFactory, WorkerFs};
