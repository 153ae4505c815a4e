//! Remote Backend Port
//!
//! The narrow capability interface every transfer protocol implements.
//! Implementations:
//! - `FtpBackend` - FTP with optional explicit TLS
//! - `SftpBackend` - SFTP over SSH (password or key)
//! - `MemoryBackend` - in-memory tree, no network
//!
//! Network failures are returned as `BackendError` values, never panics, so
//! the driver can inspect them and decide whether to continue.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entities::Verb;
use crate::domain::value_objects::{ConnectionState, Endpoint, RemoteEntry};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend operation errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// No session is open
    #[error("not connected")]
    NotConnected,

    /// The session died mid-run; every later call would fail too
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("{path}: no such file or directory")]
    NotFound { path: String },

    /// A protocol operation was refused or failed
    #[error("{op} {path}: {message}")]
    Operation {
        op: &'static str,
        path: String,
        message: String,
    },

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    /// Reading or writing the local side of a transfer failed
    #[error("{}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    pub fn operation(op: &'static str, path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Operation {
            op,
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Connection-level failures abort the remaining batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotConnected | Self::ConnectionLost(_))
    }
}

/// Result of `connect`: a value, never a panic or error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectResult {
    pub ok: bool,
    pub message: Option<String>,
}

impl ConnectResult {
    pub fn connected() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }
}

/// How a backend moves directory trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeTransfer {
    /// The engine walks the tree and transfers entry by entry
    #[default]
    PerEntry,
    /// The backend copies a whole subtree at once (`upload_tree` /
    /// `download_tree`); filtering happens through a staging directory
    Bulk,
}

/// What a whole-tree transfer did, as remote paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeReport {
    /// Files written (upload) or read (download)
    pub files: Vec<String>,
    /// Remote symlinks left in place; a tree download never follows them
    pub symlinks: Vec<String>,
}

/// Trait for remote transfer backends
///
/// All paths are remote POSIX paths unless typed as `Path`.
pub trait RemoteBackend {
    /// Short protocol name for messages ("ftp", "sftp", ...)
    fn protocol(&self) -> &'static str;

    fn state(&self) -> ConnectionState;

    /// Open the session. Failure is reported in the result.
    fn connect(&mut self, endpoint: &Endpoint) -> ConnectResult;

    /// What is at `path`? `Absent` on any lookup failure.
    fn probe(&mut self, path: &str) -> RemoteEntry;

    /// Directory contents (names only, no `.`/`..`)
    fn list_children(&mut self, dir: &str) -> BackendResult<Vec<RemoteEntry>>;

    /// Stream a remote file into `sink`; returns bytes copied
    fn get_file(&mut self, remote: &str, sink: &mut dyn Write) -> BackendResult<u64>;

    /// Stream `source` into a remote file; returns bytes copied
    fn put_stream(&mut self, source: &mut dyn Read, remote: &str) -> BackendResult<u64>;

    /// Upload a local file
    fn put_file(&mut self, local: &Path, remote: &str) -> BackendResult<u64> {
        let file = File::open(local).map_err(|e| BackendError::local_io(local, e))?;
        let mut reader = BufReader::new(file);
        self.put_stream(&mut reader, remote)
    }

    /// Upload in-memory content
    fn put_bytes(&mut self, bytes: &[u8], remote: &str) -> BackendResult<u64> {
        let mut reader = bytes;
        self.put_stream(&mut reader, remote)
    }

    fn make_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()>;

    fn remove_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()>;

    fn remove_file(&mut self, path: &str) -> BackendResult<()>;

    fn rename(&mut self, from: &str, to: &str) -> BackendResult<()>;

    /// Tear the session down. Idempotent; `Ok` when never connected.
    fn close(&mut self) -> BackendResult<()>;

    /// Whether this backend implements `verb`
    fn supports(&self, _verb: Verb) -> bool {
        true
    }

    fn tree_transfer(&self) -> TreeTransfer {
        TreeTransfer::PerEntry
    }

    /// Copy a local directory tree into the existing directory `remote`.
    /// The tree holds only regular files and directories.
    fn upload_tree(&mut self, _local: &Path, _remote: &str) -> BackendResult<TreeReport> {
        Err(BackendError::Unsupported("upload_tree"))
    }

    /// Copy a remote directory tree to `local`, skipping remote symlinks
    fn download_tree(&mut self, _remote: &str, _local: &Path) -> BackendResult<TreeReport> {
        Err(BackendError::Unsupported("download_tree"))
    }
}

impl<B: RemoteBackend + ?Sized> RemoteBackend for Box<B> {
    fn protocol(&self) -> &'static str {
        (**self).protocol()
    }

    fn state(&self) -> ConnectionState {
        (**self).state()
    }

    fn connect(&mut self, endpoint: &Endpoint) -> ConnectResult {
        (**self).connect(endpoint)
    }

    fn probe(&mut self, path: &str) -> RemoteEntry {
        (**self).probe(path)
    }

    fn list_children(&mut self, dir: &str) -> BackendResult<Vec<RemoteEntry>> {
        (**self).list_children(dir)
    }

    fn get_file(&mut self, remote: &str, sink: &mut dyn Write) -> BackendResult<u64> {
        (**self).get_file(remote, sink)
    }

    fn put_stream(&mut self, source: &mut dyn Read, remote: &str) -> BackendResult<u64> {
        (**self).put_stream(source, remote)
    }

    fn put_file(&mut self, local: &Path, remote: &str) -> BackendResult<u64> {
        (**self).put_file(local, remote)
    }

    fn put_bytes(&mut self, bytes: &[u8], remote: &str) -> BackendResult<u64> {
        (**self).put_bytes(bytes, remote)
    }

    fn make_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        (**self).make_directory(path, recursive)
    }

    fn remove_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        (**self).remove_directory(path, recursive)
    }

    fn remove_file(&mut self, path: &str) -> BackendResult<()> {
        (**self).remove_file(path)
    }

    fn rename(&mut self, from: &str, to: &str) -> BackendResult<()> {
        (**self).rename(from, to)
    }

    fn close(&mut self) -> BackendResult<()> {
        (**self).close()
    }

    fn supports(&self, verb: Verb) -> bool {
        (**self).supports(verb)
    }

    fn tree_transfer(&self) -> TreeTransfer {
        (**self).tree_transfer()
    }

    fn upload_tree(&mut self, local: &Path, remote: &str) -> BackendResult<TreeReport> {
        (**self).upload_tree(local, remote)
    }

    fn download_tree(&mut self, remote: &str, local: &Path) -> BackendResult<TreeReport> {
        (**self).download_tree(remote, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_fatal() {
        assert!(BackendError::NotConnected.is_fatal());
        assert!(BackendError::ConnectionLost("reset".into()).is_fatal());
        assert!(!BackendError::NotFound { path: "/x".into() }.is_fatal());
        assert!(!BackendError::operation("put", "/x", "denied").is_fatal());
    }

    #[test]
    fn error_messages_name_the_path() {
        let err = BackendError::operation("mkdir", "/site/a", "550 Permission denied");
        assert_eq!(err.to_string(), "mkdir /site/a: 550 Permission denied");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = BackendError::local_io("dist/a.txt", io);
        assert_eq!(err.to_string(), "dist/a.txt: missing");
    }
}
