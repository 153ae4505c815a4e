//! Transfer operations
//!
//! A `TransferOperation` is one compiled unit of work; an `ActionBatch` is the
//! ordered list the driver executes. Order is significant (an upload must run
//! before a dependent move) and is never changed after compilation.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The recognized operation verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Local path (file or directory) to remote path
    Upload,
    /// Remote path (file or directory) to local path
    Download,
    /// In-memory content to remote file
    Write,
    /// Remote rename
    Move,
    /// Remote file or directory removal
    Delete,
    /// Remove the contents of a remote directory, keeping the directory
    Clean,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Upload,
        Verb::Download,
        Verb::Write,
        Verb::Move,
        Verb::Delete,
        Verb::Clean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Upload => "upload",
            Verb::Download => "download",
            Verb::Write => "write",
            Verb::Move => "move",
            Verb::Delete => "delete",
            Verb::Clean => "clean",
        }
    }

    /// Number of arguments the verb takes after its name
    pub fn arity(&self) -> usize {
        match self {
            Verb::Upload | Verb::Download | Verb::Write | Verb::Move => 2,
            Verb::Delete | Verb::Clean => 1,
        }
    }

    /// Past-tense label used in reports ("Uploaded", "Deleted", ...)
    pub fn past_tense(&self) -> &'static str {
        match self {
            Verb::Upload => "Uploaded",
            Verb::Download => "Downloaded",
            Verb::Write => "Written",
            Verb::Move => "Moved",
            Verb::Delete => "Deleted",
            Verb::Clean => "Cleaned",
        }
    }

    /// Capitalized label ("Upload", "Delete", ...)
    pub fn title(&self) -> &'static str {
        match self {
            Verb::Upload => "Upload",
            Verb::Download => "Download",
            Verb::Write => "Write",
            Verb::Move => "Move",
            Verb::Delete => "Delete",
            Verb::Clean => "Clean",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a verb name is not in the recognized set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// One compiled unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOperation {
    pub verb: Verb,
    /// Local path (upload), remote path (download/move/delete/clean), or
    /// literal content (write)
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Local file this operation was derived from; subject to scoping and
    /// ignore filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<PathBuf>,
    /// Local file a rename moved away from; scoped like `origin`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_origin: Option<PathBuf>,
}

impl TransferOperation {
    fn new(verb: Verb, source: impl Into<String>, destination: Option<String>) -> Self {
        Self {
            verb,
            source: source.into(),
            destination,
            origin: None,
            previous_origin: None,
        }
    }

    /// Upload a local path; the source is its own origin
    pub fn upload(local: impl Into<String>, remote: impl Into<String>) -> Self {
        let local = local.into();
        let origin = PathBuf::from(&local);
        Self::new(Verb::Upload, local, Some(remote.into())).with_origin(origin)
    }

    pub fn download(remote: impl Into<String>, local: impl Into<String>) -> Self {
        Self::new(Verb::Download, remote, Some(local.into()))
    }

    pub fn write(content: impl Into<String>, remote: impl Into<String>) -> Self {
        Self::new(Verb::Write, content, Some(remote.into()))
    }

    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(Verb::Move, from, Some(to.into()))
    }

    pub fn delete(remote: impl Into<String>) -> Self {
        Self::new(Verb::Delete, remote, None)
    }

    pub fn clean(remote: impl Into<String>) -> Self {
        Self::new(Verb::Clean, remote, None)
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_previous_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.previous_origin = Some(origin.into());
        self
    }

    /// Local origins this operation depends on, current first
    pub fn origins(&self) -> impl Iterator<Item = &Path> {
        self.origin().into_iter().chain(self.previous_origin.as_deref())
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Path reported in outcomes: the destination for verbs that create
    /// remote content, the source otherwise
    pub fn file(&self) -> &str {
        match self.verb {
            Verb::Upload | Verb::Write => self.destination().unwrap_or(&self.source),
            _ => &self.source,
        }
    }
}

impl fmt::Display for TransferOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.verb, self.destination()) {
            (Verb::Write, Some(dst)) => write!(f, "write {:?} -> {}", self.source, dst),
            (verb, Some(dst)) => write!(f, "{} {} -> {}", verb, self.source, dst),
            (verb, None) => write!(f, "{} {}", verb, self.source),
        }
    }
}

/// Ordered sequence of operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionBatch {
    operations: Vec<TransferOperation>,
}

impl ActionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: TransferOperation) {
        self.operations.push(operation);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransferOperation> {
        self.operations.iter()
    }

    pub fn operations(&self) -> &[TransferOperation] {
        &self.operations
    }

    /// One line per operation, in execution order
    pub fn render(&self) -> String {
        self.operations
            .iter()
            .map(|op| op.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<TransferOperation> for ActionBatch {
    fn from_iter<I: IntoIterator<Item = TransferOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActionBatch {
    type Item = &'a TransferOperation;
    type IntoIter = std::slice::Iter<'a, TransferOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl IntoIterator for ActionBatch {
    type Item = TransferOperation;
    type IntoIter = std::vec::IntoIter<TransferOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}
