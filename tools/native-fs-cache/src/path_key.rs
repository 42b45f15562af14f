use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::config::CaseSensitivity;
use crate::filesystem::{FsError, Result};

/// Normalized absolute path used as the cache key.
///
/// Separators are always `/`. Equality and hashing follow the case policy the
/// key was built with, while `as_str` keeps the original spelling.
#[derive(Debug, Clone)]
pub struct PathKey {
    path: String,
    key: String,
    root_len: usize,
    case: CaseSensitivity,
}

impl PathKey {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_case(path, CaseSensitivity::host())
    }

    pub fn with_case(path: impl AsRef<Path>, case: CaseSensitivity) -> Result<Self> {
        let raw = path.as_ref().to_string_lossy();
        Self::parse(&raw, case, cfg!(windows))
    }

    fn parse(raw: &str, case: CaseSensitivity, windows: bool) -> Result<Self> {
        let raw = if windows {
            raw.replace('\\', "/")
        } else {
            raw.to_string()
        };

        let (root, rest) = split_root(&raw, windows).ok_or_else(|| FsError::InvalidPath(raw.clone()))?;

        let mut segments: Vec<&str> = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    // `..` at the root stays at the root
                    segments.pop();
                }
                name => segments.push(name),
            }
        }

        let normalized = format!("{}{}", root, segments.join("/"));
        Ok(Self::from_normalized(normalized, root.len(), case))
    }

    fn from_normalized(path: String, root_len: usize, case: CaseSensitivity) -> Self {
        let key = match case {
            CaseSensitivity::Sensitive => path.clone(),
            CaseSensitivity::Insensitive => path.to_lowercase(),
        };
        Self {
            path,
            key,
            root_len,
            case,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// Path with the host's separators, for handing to the OS.
    pub fn to_native_path(&self) -> PathBuf {
        if cfg!(windows) {
            // Verbatim `\\?\` paths are not normalized by Windows, so `/` must go
            PathBuf::from(self.path.replace('/', "\\"))
        } else {
            PathBuf::from(&self.path)
        }
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    pub fn is_root(&self) -> bool {
        self.path.len() == self.root_len
    }

    pub fn parent(&self) -> Option<PathKey> {
        if self.is_root() {
            return None;
        }
        let idx = self.path.rfind('/')?;
        let end = if idx < self.root_len { self.root_len } else { idx };
        Some(Self::from_normalized(
            self.path[..end].to_string(),
            self.root_len,
            self.case,
        ))
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.path.rfind('/').map(|idx| &self.path[idx + 1..])
    }

    /// Appends a single name segment, as returned by a directory listing.
    pub fn child(&self, name: &str) -> PathKey {
        let path = if self.is_root() {
            format!("{}{}", self.path, name)
        } else {
            format!("{}/{}", self.path, name)
        };
        Self::from_normalized(path, self.root_len, self.case)
    }
}

/// Splits off the root prefix, always ending in `/`. `None` for a relative path.
///
/// Windows roots also cover UNC shares (`//server/share/`) and verbatim
/// prefixes (`//?/C:/`, `//?/UNC/server/share/`).
fn split_root(path: &str, windows: bool) -> Option<(String, &str)> {
    if windows {
        if let Some(rest) = path.strip_prefix("//?/") {
            if let Some(unc) = rest.strip_prefix("UNC/") {
                let (share, rest) = split_share(unc)?;
                return Some((format!("//?/UNC/{}", share), rest));
            }
            let (drive, rest) = split_drive(rest)?;
            return Some((format!("//?/{}", drive), rest));
        }
        if let Some(unc) = path.strip_prefix("//") {
            let (share, rest) = split_share(unc)?;
            return Some((format!("//{}", share), rest));
        }
    }
    if let Some(rest) = path.strip_prefix('/') {
        return Some(("/".to_string(), rest));
    }
    split_drive(path)
}

fn split_share(path: &str) -> Option<(String, &str)> {
    let mut parts = path.splitn(3, '/');
    let server = parts.next().filter(|s| !s.is_empty())?;
    let share = parts.next().filter(|s| !s.is_empty())?;
    Some((format!("{}/{}/", server, share), parts.next().unwrap_or("")))
}

fn split_drive(path: &str) -> Option<(String, &str)> {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/' {
        return Some((path[..3].to_string(), &path[3..]));
    }
    None
}

impl PartialEq for PathKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PathKey {}

impl Hash for PathKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
