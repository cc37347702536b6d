//! Core data structures: file identity and project roots

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use crate::error::CoreError;

/// Whether the host filesystem compares paths case-insensitively.
pub const CASE_INSENSITIVE_FS: bool = cfg!(any(windows, target_os = "macos"));

/// A source file, identified by its normalized absolute path.
///
/// Two `SourceFile`s are equal when their normalized paths are equal. On
/// case-insensitive hosts the comparison ignores case. Ordering follows the
/// same key, so sets and maps of files iterate deterministically.
#[derive(Clone)]
pub struct SourceFile {
    path: PathBuf,
    key: String,
}

impl SourceFile {
    /// Create a file handle from an absolute path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(CoreError::RelativePath(path.to_path_buf()));
        }
        let path = normalize_path(path);
        let key = identity_key(&path);
        Ok(SourceFile { path, key })
    }

    /// The normalized absolute path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this file exists on disk as a regular file.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Whether this file lies under `root` (component-wise, never by string prefix).
    pub fn is_within(&self, root: &ProjectRoot) -> bool {
        Path::new(&self.key).starts_with(Path::new(&root.dir.key))
    }

    /// Root-relative path joined with forward slashes, or `None` if outside `root`.
    pub fn relative_to(&self, root: &ProjectRoot) -> Option<String> {
        if !self.is_within(root) {
            return None;
        }
        let depth = root.path().components().count();
        let parts: Vec<String> = self
            .path
            .components()
            .skip(depth)
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl PartialEq for SourceFile {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SourceFile {}

impl Hash for SourceFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for SourceFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceFile({})", self.path.display())
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// The filesystem boundary within which dependency edges are retained.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRoot {
    dir: SourceFile,
}

impl ProjectRoot {
    /// Create a root from an absolute directory path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        Ok(ProjectRoot {
            dir: SourceFile::new(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Resolve a root-relative path into a file handle.
    ///
    /// Absolute paths and paths that climb out of the root yield `None`.
    pub fn resolve(&self, relative: &str) -> Option<SourceFile> {
        let relative = Path::new(relative);
        if relative.has_root() || relative.is_absolute() {
            return None;
        }
        let file = SourceFile::new(self.path().join(relative)).ok()?;
        file.is_within(self).then_some(file)
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into their parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn identity_key(path: &Path) -> String {
    let key = path.to_string_lossy();
    if CASE_INSENSITIVE_FS {
        key.to_lowercase()
    } else {
        key.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c/d.cs")),
            PathBuf::from("/a/c/d.cs")
        );
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_relative_path_rejected() {
        let err = SourceFile::new("src/lib.cs").unwrap_err();
        assert!(matches!(err, CoreError::RelativePath(_)));
    }

    #[test]
    fn test_identity_uses_normalized_path() {
        let a = SourceFile::new("/repo/src/../src/A.cs").unwrap();
        let b = SourceFile::new("/repo/src/A.cs").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path(), Path::new("/repo/src/A.cs"));
    }

    #[test]
    fn test_within_is_component_wise() {
        let root = ProjectRoot::new("/repo/app").unwrap();
        let inside = SourceFile::new("/repo/app/Models/Order.cs").unwrap();
        let sibling = SourceFile::new("/repo/application/Order.cs").unwrap();

        assert!(inside.is_within(&root));
        assert!(!sibling.is_within(&root));
        assert_eq!(inside.relative_to(&root).as_deref(), Some("Models/Order.cs"));
        assert_eq!(sibling.relative_to(&root), None);
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let root = ProjectRoot::new("/repo").unwrap();
        assert_eq!(
            root.resolve("src/A.cs"),
            Some(SourceFile::new("/repo/src/A.cs").unwrap())
        );
        assert_eq!(root.resolve("../outside/A.cs"), None);
        assert_eq!(root.resolve("/etc/passwd"), None);
    }
}
