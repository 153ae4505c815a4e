//! Remote entry value object
//!
//! The answer to "what is at this path?". Every probe produces a fresh entry;
//! entries are never cached because the remote tree can change between checks.

use serde::Serialize;

/// Kind of node found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Absent,
}

impl EntryKind {
    pub fn exists(&self) -> bool {
        !matches!(self, EntryKind::Absent)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Absent => "absent",
        };
        f.write_str(s)
    }
}

/// Result of an existence or listing probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Base name of the entry (no directory part)
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Absent)
    }

    pub fn exists(&self) -> bool {
        self.kind.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entry_does_not_exist() {
        assert!(!RemoteEntry::absent("x").exists());
        assert!(RemoteEntry::new("x", EntryKind::Symlink).exists());
    }

    #[test]
    fn entry_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntryKind::Directory).unwrap();
        assert_eq!(json, "\"directory\"");
    }
}
