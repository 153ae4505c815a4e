//! In-memory remote backend
//!
//! A POSIX-like tree held in a `BTreeMap`, used to drive the engine without a
//! server. Every call is logged so callers can assert which primitives ran.
//! Semantics follow a strict FTP server: `put` needs an existing parent,
//! non-recursive `mkdir` needs an existing parent and fails on existing paths.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tracing::trace;

use crate::domain::entities::Verb;
use crate::domain::ports::{
    BackendError, BackendResult, ConnectResult, RemoteBackend, TreeReport, TreeTransfer,
};
use crate::domain::value_objects::{ConnectionState, Endpoint, EntryKind, RemoteEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Directory,
    Symlink(String),
}

/// A logged backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    List(String),
    Get(String),
    Put(String),
    MakeDirectory(String),
    RemoveDirectory(String),
    RemoveFile(String),
    Rename(String, String),
    UploadTree(String),
    DownloadTree(String),
    Close,
}

impl Call {
    /// Calls that move file content
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Call::Get(_) | Call::Put(_) | Call::UploadTree(_) | Call::DownloadTree(_)
        )
    }
}

#[derive(Debug)]
pub struct MemoryBackend {
    nodes: BTreeMap<String, Node>,
    state: ConnectionState,
    calls: Vec<Call>,
    tree_transfer: TreeTransfer,
    unsupported: Vec<Verb>,
    fail_connect: Option<String>,
    disconnect_after: Option<usize>,
    operations: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Directory);
        Self {
            nodes,
            state: ConnectionState::Disconnected,
            calls: Vec::new(),
            tree_transfer: TreeTransfer::PerEntry,
            unsupported: Vec::new(),
            fail_connect: None,
            disconnect_after: None,
            operations: 0,
        }
    }

    pub fn with_tree_transfer(mut self, mode: TreeTransfer) -> Self {
        self.tree_transfer = mode;
        self
    }

    pub fn without_verb(mut self, verb: Verb) -> Self {
        self.unsupported.push(verb);
        self
    }

    /// Make `connect` fail with `message`
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.fail_connect = Some(message.into());
        self
    }

    /// Drop the connection after `n` successful operations
    pub fn disconnect_after(mut self, n: usize) -> Self {
        self.disconnect_after = Some(n);
        self
    }

    /// Seed a file, creating its parent directories
    pub fn with_file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        let path = normalize(path);
        self.create_ancestors(&path);
        self.nodes.insert(path, Node::File(content.as_ref().to_vec()));
        self
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        let path = normalize(path);
        self.create_ancestors(&path);
        self.nodes.insert(path, Node::Directory);
        self
    }

    pub fn with_symlink(mut self, path: &str, target: &str) -> Self {
        let path = normalize(path);
        self.create_ancestors(&path);
        self.nodes.insert(path, Node::Symlink(target.to_string()));
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn transfer_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_transfer()).count()
    }

    pub fn close_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Close).count()
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        match self.nodes.get(&normalize(path)) {
            Some(Node::File(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(&normalize(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.get(&normalize(path)), Some(Node::Directory))
    }

    /// Every path in the tree except the root, sorted
    pub fn paths(&self) -> Vec<&str> {
        self.nodes
            .keys()
            .filter(|k| k.as_str() != "/")
            .map(String::as_str)
            .collect()
    }

    fn create_ancestors(&mut self, path: &str) {
        let mut current = parent_of(path);
        while let Some(dir) = current {
            self.nodes.entry(dir.clone()).or_insert(Node::Directory);
            current = parent_of(&dir);
        }
    }

    /// Gate every operation on a live session
    fn begin(&mut self, call: Call) -> BackendResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(BackendError::NotConnected);
        }
        if let Some(limit) = self.disconnect_after {
            if self.operations >= limit {
                self.state = ConnectionState::Failed;
                return Err(BackendError::ConnectionLost(
                    "connection reset by peer".to_string(),
                ));
            }
        }
        self.operations += 1;
        trace!(?call, "memory backend call");
        self.calls.push(call);
        Ok(())
    }

    fn descendants(&self, dir: &str) -> Vec<String> {
        let prefix = child_prefix(dir);
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn require_parent_dir(&self, op: &'static str, path: &str) -> BackendResult<()> {
        match parent_of(path) {
            Some(parent) if !matches!(self.nodes.get(&parent), Some(Node::Directory)) => Err(
                BackendError::operation(op, path, "parent directory does not exist"),
            ),
            _ => Ok(()),
        }
    }
}

impl RemoteBackend for MemoryBackend {
    fn protocol(&self) -> &'static str {
        "memory"
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn connect(&mut self, _endpoint: &Endpoint) -> ConnectResult {
        self.calls.push(Call::Connect);
        self.state = ConnectionState::Connecting;
        match &self.fail_connect {
            Some(message) => {
                self.state = ConnectionState::Failed;
                ConnectResult::failed(message.clone())
            }
            None => {
                self.state = ConnectionState::Connected;
                ConnectResult::connected()
            }
        }
    }

    fn probe(&mut self, path: &str) -> RemoteEntry {
        let path = normalize(path);
        let name = file_name(&path).to_string();
        if !self.state.is_connected() {
            return RemoteEntry::absent(name);
        }
        let kind = match self.nodes.get(&path) {
            Some(Node::File(_)) => EntryKind::File,
            Some(Node::Directory) => EntryKind::Directory,
            Some(Node::Symlink(_)) => EntryKind::Symlink,
            None => EntryKind::Absent,
        };
        RemoteEntry::new(name, kind)
    }

    fn list_children(&mut self, dir: &str) -> BackendResult<Vec<RemoteEntry>> {
        let dir = normalize(dir);
        self.begin(Call::List(dir.clone()))?;
        if !matches!(self.nodes.get(&dir), Some(Node::Directory)) {
            return Err(BackendError::NotFound { path: dir });
        }
        let prefix = child_prefix(&dir);
        Ok(self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, node)| {
                let kind = match node {
                    Node::File(_) => EntryKind::File,
                    Node::Directory => EntryKind::Directory,
                    Node::Symlink(_) => EntryKind::Symlink,
                };
                RemoteEntry::new(&k[prefix.len()..], kind)
            })
            .collect())
    }

    fn get_file(&mut self, remote: &str, sink: &mut dyn Write) -> BackendResult<u64> {
        let path = normalize(remote);
        self.begin(Call::Get(path.clone()))?;
        match self.nodes.get(&path) {
            Some(Node::File(bytes)) => {
                sink.write_all(bytes)
                    .map_err(|e| BackendError::operation("get", &path, e))?;
                Ok(bytes.len() as u64)
            }
            Some(_) => Err(BackendError::operation("get", path, "not a regular file")),
            None => Err(BackendError::NotFound { path }),
        }
    }

    fn put_stream(&mut self, source: &mut dyn Read, remote: &str) -> BackendResult<u64> {
        let path = normalize(remote);
        self.begin(Call::Put(path.clone()))?;
        self.require_parent_dir("put", &path)?;
        if matches!(self.nodes.get(&path), Some(Node::Directory)) {
            return Err(BackendError::operation("put", path, "is a directory"));
        }
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|e| BackendError::operation("put", &path, e))?;
        let len = bytes.len() as u64;
        self.nodes.insert(path, Node::File(bytes));
        Ok(len)
    }

    fn make_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        let path = normalize(path);
        self.begin(Call::MakeDirectory(path.clone()))?;
        match self.nodes.get(&path) {
            Some(Node::Directory) if recursive => return Ok(()),
            Some(_) => return Err(BackendError::operation("mkdir", path, "already exists")),
            None => {}
        }
        if recursive {
            let mut missing = Vec::new();
            let mut current = parent_of(&path);
            while let Some(dir) = current {
                match self.nodes.get(&dir) {
                    Some(Node::Directory) => break,
                    Some(_) => {
                        return Err(BackendError::operation("mkdir", dir, "not a directory"))
                    }
                    None => {
                        current = parent_of(&dir);
                        missing.push(dir);
                    }
                }
            }
            for dir in missing {
                self.nodes.insert(dir, Node::Directory);
            }
        } else {
            self.require_parent_dir("mkdir", &path)?;
        }
        self.nodes.insert(path, Node::Directory);
        Ok(())
    }

    fn remove_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        let path = normalize(path);
        self.begin(Call::RemoveDirectory(path.clone()))?;
        if path == "/" {
            return Err(BackendError::operation("rmdir", path, "cannot remove root"));
        }
        match self.nodes.get(&path) {
            Some(Node::Directory) => {}
            Some(_) => return Err(BackendError::operation("rmdir", path, "not a directory")),
            None => return Err(BackendError::NotFound { path }),
        }
        let descendants = self.descendants(&path);
        if !descendants.is_empty() && !recursive {
            return Err(BackendError::operation("rmdir", path, "directory not empty"));
        }
        for key in descendants {
            self.nodes.remove(&key);
        }
        self.nodes.remove(&path);
        Ok(())
    }

    fn remove_file(&mut self, path: &str) -> BackendResult<()> {
        let path = normalize(path);
        self.begin(Call::RemoveFile(path.clone()))?;
        match self.nodes.get(&path) {
            Some(Node::File(_)) | Some(Node::Symlink(_)) => {
                self.nodes.remove(&path);
                Ok(())
            }
            Some(Node::Directory) => Err(BackendError::operation("rm", path, "is a directory")),
            None => Err(BackendError::NotFound { path }),
        }
    }

    fn rename(&mut self, from: &str, to: &str) -> BackendResult<()> {
        let from = normalize(from);
        let to = normalize(to);
        self.begin(Call::Rename(from.clone(), to.clone()))?;
        let node = self
            .nodes
            .remove(&from)
            .ok_or_else(|| BackendError::NotFound { path: from.clone() })?;
        if let Err(e) = self.require_parent_dir("rename", &to) {
            self.nodes.insert(from, node);
            return Err(e);
        }
        if matches!(self.nodes.get(&to), Some(Node::Directory)) {
            self.nodes.insert(from, node);
            return Err(BackendError::operation("rename", to, "destination is a directory"));
        }
        let moved = self.descendants(&from);
        for key in moved {
            if let Some(child) = self.nodes.remove(&key) {
                let suffix = &key[from.len()..];
                self.nodes.insert(format!("{}{}", to, suffix), child);
            }
        }
        self.nodes.insert(to, node);
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Failed
        ) && self.calls.contains(&Call::Connect)
        {
            self.calls.push(Call::Close);
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn supports(&self, verb: Verb) -> bool {
        !self.unsupported.contains(&verb)
    }

    fn tree_transfer(&self) -> TreeTransfer {
        self.tree_transfer
    }

    fn upload_tree(&mut self, local: &Path, remote: &str) -> BackendResult<TreeReport> {
        let root = normalize(remote);
        self.begin(Call::UploadTree(root.clone()))?;
        match self.nodes.get(&root) {
            Some(Node::Directory) => {}
            Some(_) => return Err(BackendError::operation("mkdir", root, "not a directory")),
            None => {
                self.nodes.insert(root.clone(), Node::Directory);
                self.create_ancestors(&root);
            }
        }
        let mut report = TreeReport::default();
        upload_dir(self, local, &root, &mut report)?;
        Ok(report)
    }

    fn download_tree(&mut self, remote: &str, local: &Path) -> BackendResult<TreeReport> {
        let root = normalize(remote);
        self.begin(Call::DownloadTree(root.clone()))?;
        if !matches!(self.nodes.get(&root), Some(Node::Directory)) {
            return Err(BackendError::NotFound { path: root });
        }
        fs::create_dir_all(local).map_err(|e| BackendError::local_io(local, e))?;

        let mut report = TreeReport::default();
        let prefix = child_prefix(&root);
        for key in self.descendants(&root) {
            let target = local.join(&key[prefix.len()..]);
            match self.nodes.get(&key) {
                Some(Node::Directory) => {
                    fs::create_dir_all(&target).map_err(|e| BackendError::local_io(&target, e))?
                }
                Some(Node::File(bytes)) => {
                    fs::write(&target, bytes).map_err(|e| BackendError::local_io(&target, e))?;
                    report.files.push(key);
                }
                Some(Node::Symlink(_)) => report.symlinks.push(key),
                None => {}
            }
        }
        Ok(report)
    }
}

fn upload_dir(
    backend: &mut MemoryBackend,
    local: &Path,
    remote: &str,
    report: &mut TreeReport,
) -> BackendResult<()> {
    let mut entries: Vec<_> = fs::read_dir(local)
        .map_err(|e| BackendError::local_io(local, e))?
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let target = format!(
            "{}{}",
            child_prefix(remote),
            entry.file_name().to_string_lossy()
        );
        let meta = fs::metadata(&path).map_err(|e| BackendError::local_io(&path, e))?;
        if meta.is_dir() {
            backend.nodes.insert(target.clone(), Node::Directory);
            upload_dir(backend, &path, &target, report)?;
        } else {
            let bytes = fs::read(&path).map_err(|e| BackendError::local_io(&path, e))?;
            backend.nodes.insert(target.clone(), Node::File(bytes));
            report.files.push(target);
        }
    }
    Ok(())
}

/// Absolute, slash-separated, no `.`/`..`/empty segments. Relative paths are
/// taken relative to `/`.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

fn child_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{}/", dir)
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
