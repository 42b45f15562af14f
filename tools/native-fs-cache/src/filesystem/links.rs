use std::fs;
use std::path::Path;

/// Decides whether a path is a symbolic link that no longer resolves.
pub trait LinkResolver: Send {
    fn is_invalid_symlink(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct FsLinkResolver;

impl FsLinkResolver {
    pub fn new() -> Self {
        Self
    }
}

impl LinkResolver for FsLinkResolver {
    fn is_invalid_symlink(&self, path: &Path) -> bool {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_symlink() => fs::metadata(path).is_err(),
            _ => false,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_detects_dangling_link() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        let link = temp.path().join("link");
        fs::create_dir(&target).unwrap();
        symlink(&target, &link).unwrap();

        let resolver = FsLinkResolver::new();
        assert!(!resolver.is_invalid_symlink(&link));
        assert!(!resolver.is_invalid_symlink(&target));

        fs::remove_dir(&target).unwrap();
        assert!(resolver.is_invalid_symlink(&link));
        assert!(!resolver.is_invalid_symlink(&temp.path().join("absent")));
    }
}
