//! Path value objects
//!
//! - `LocalScope`: the local root prefix every local source must lie under
//! - Remote path helpers: remote paths are POSIX strings regardless of the
//!   host platform, so they are handled as `&str`, never as `Path`.

use std::path::{Component, Path, PathBuf};

/// The declared local root prefix.
///
/// Containment is decided by path components, not string prefixes:
/// `dist2/a.txt` is not under `dist`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalScope {
    root: PathBuf,
}

impl LocalScope {
    /// Create a scope rooted at `root`. An empty root or `.` admits every path.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize_local(root.as_ref()),
        }
    }

    /// A scope that admits every path
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_unrestricted(&self) -> bool {
        self.root.as_os_str().is_empty()
    }

    /// Check whether `path` lies under the scope root
    pub fn contains(&self, path: &Path) -> bool {
        self.relative(path).is_some()
    }

    /// Path relative to the scope root, or `None` when outside the scope.
    ///
    /// `..` is resolved lexically first, so `dist/../secret.env` is outside
    /// `dist`, and a path that climbs above the root is outside any scope.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        let path = normalize_local(path);
        let rel = path.strip_prefix(&self.root).ok()?;
        match rel.components().next() {
            Some(Component::ParentDir) => None,
            _ => Some(rel.to_path_buf()),
        }
    }
}

impl std::fmt::Display for LocalScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unrestricted() {
            f.write_str(".")
        } else {
            write!(f, "{}", self.root.display())
        }
    }
}

/// Drop `.` and fold `name/..` pairs. A `..` that would climb past the start
/// is kept, except directly under a root where it is meaningless.
pub(crate) fn normalize_local(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Render a relative local path as a remote (slash-separated) path
pub fn to_remote_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a relative path onto a remote root.
///
/// `remote_join("/site", "a/b.txt") == "/site/a/b.txt"`; an empty root leaves
/// the path relative to the server's working directory.
pub fn remote_join(root: &str, rel: &str) -> String {
    let rel = rel.trim_start_matches("./").trim_start_matches('/');
    if rel.is_empty() {
        return root.to_string();
    }
    if root.is_empty() || root == "." {
        return rel.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), rel)
}

/// Parent directory of a remote path.
///
/// Returns `None` for a bare name (its parent is the working directory) and for
/// the root itself.
pub fn remote_parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(0) => None,
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

/// Final component of a remote path
pub fn remote_file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
