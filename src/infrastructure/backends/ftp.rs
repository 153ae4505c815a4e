//! FTP backend (suppaftp)
//!
//! Plain FTP, or explicit TLS (`AUTH TLS`) when the endpoint is `secure`.
//! FTP has no stat command, so `probe` lists the parent directory and looks
//! the name up. Trees are transferred entry by entry.

use std::io::{self, Read, Write};
use std::str::FromStr;

use suppaftp::list::File as ListEntry;
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, NativeTlsConnector, NativeTlsFtpStream};
use tracing::{debug, info};

use crate::domain::ports::{BackendError, BackendResult, ConnectResult, RemoteBackend};
use crate::domain::value_objects::{
    remote_file_name, remote_join, remote_parent, ConnectionState, Endpoint, EntryKind,
    RemoteEntry,
};

pub struct FtpBackend {
    stream: Option<NativeTlsFtpStream>,
    state: ConnectionState,
}

impl Default for FtpBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FtpBackend {
    pub fn new() -> Self {
        Self {
            stream: None,
            state: ConnectionState::Disconnected,
        }
    }

    fn stream(&mut self) -> BackendResult<&mut NativeTlsFtpStream> {
        self.stream.as_mut().ok_or(BackendError::NotConnected)
    }

    fn open_session(endpoint: &Endpoint) -> Result<NativeTlsFtpStream, String> {
        let mut stream = NativeTlsFtpStream::connect(endpoint.address())
            .map_err(|e| format!("cannot reach {}: {}", endpoint.address(), e))?;

        if endpoint.secure {
            let connector = TlsConnector::new().map_err(|e| format!("TLS setup failed: {}", e))?;
            stream = stream
                .into_secure(NativeTlsConnector::from(connector), &endpoint.host)
                .map_err(|e| format!("TLS negotiation failed: {}", e))?;
        }

        let password = endpoint.password.as_deref().unwrap_or_default();
        stream
            .login(endpoint.user.as_str(), password)
            .map_err(|e| format!("login failed: {}", e))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| format!("cannot switch to binary mode: {}", e))?;
        Ok(stream)
    }

    fn list_dir(&mut self, dir: &str) -> BackendResult<Vec<RemoteEntry>> {
        let lines = self
            .stream()?
            .list(Some(dir))
            .map_err(|e| classify("list", dir, e))?;
        Ok(lines
            .iter()
            .filter_map(|line| ListEntry::from_str(line).ok())
            .filter(|entry| !matches!(entry.name(), "." | ".."))
            .map(|entry| {
                let kind = if entry.is_symlink() {
                    EntryKind::Symlink
                } else if entry.is_directory() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                RemoteEntry::new(entry.name(), kind)
            })
            .collect())
    }

    fn remove_tree(&mut self, dir: &str) -> BackendResult<()> {
        for child in self.list_dir(dir)? {
            let path = remote_join(dir, &child.name);
            if child.kind == EntryKind::Directory {
                self.remove_tree(&path)?;
            } else {
                self.stream()?
                    .rm(&path)
                    .map_err(|e| classify("rm", &path, e))?;
            }
        }
        self.stream()?
            .rmdir(dir)
            .map_err(|e| classify("rmdir", dir, e))
    }
}

/// Connection-level failures end the session; server replies do not
fn classify(op: &'static str, path: &str, err: FtpError) -> BackendError {
    match err {
        FtpError::ConnectionError(e) => BackendError::ConnectionLost(e.to_string()),
        other => BackendError::operation(op, path, other),
    }
}

impl RemoteBackend for FtpBackend {
    fn protocol(&self) -> &'static str {
        "ftp"
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn connect(&mut self, endpoint: &Endpoint) -> ConnectResult {
        self.state = ConnectionState::Connecting;
        info!(endpoint = %endpoint.display_name(), secure = endpoint.secure, "connecting");
        match Self::open_session(endpoint) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                ConnectResult::connected()
            }
            Err(message) => {
                self.state = ConnectionState::Failed;
                ConnectResult::failed(message)
            }
        }
    }

    fn probe(&mut self, path: &str) -> RemoteEntry {
        let trimmed = path.trim_end_matches('/');
        let name = remote_file_name(path).to_string();
        if self.stream.is_none() {
            return RemoteEntry::absent(name);
        }
        if trimmed.is_empty() {
            return RemoteEntry::new("/", EntryKind::Directory);
        }

        let parent = match remote_parent(trimmed) {
            Some(parent) => parent.to_string(),
            None => ".".to_string(),
        };
        match self.list_dir(&parent) {
            Ok(entries) => entries
                .into_iter()
                .find(|e| e.name == name)
                .unwrap_or_else(|| RemoteEntry::absent(name)),
            Err(_) => RemoteEntry::absent(name),
        }
    }

    fn list_children(&mut self, dir: &str) -> BackendResult<Vec<RemoteEntry>> {
        self.list_dir(dir)
    }

    fn get_file(&mut self, remote: &str, sink: &mut dyn Write) -> BackendResult<u64> {
        debug!(remote, "ftp get");
        let stream = self.stream()?;
        let mut data = stream
            .retr_as_stream(remote)
            .map_err(|e| classify("get", remote, e))?;
        let copied = io::copy(&mut data, sink);
        stream
            .finalize_retr_stream(data)
            .map_err(|e| classify("get", remote, e))?;
        copied.map_err(|e| BackendError::operation("get", remote, e))
    }

    fn put_stream(&mut self, mut source: &mut dyn Read, remote: &str) -> BackendResult<u64> {
        debug!(remote, "ftp put");
        self.stream()?
            .put_file(remote, &mut source)
            .map_err(|e| classify("put", remote, e))
    }

    fn make_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        if !recursive {
            return self
                .stream()?
                .mkdir(path)
                .map_err(|e| classify("mkdir", path, e));
        }

        let mut missing = Vec::new();
        let mut current = Some(path);
        while let Some(dir) = current {
            match self.probe(dir).kind {
                EntryKind::Directory => break,
                EntryKind::Absent => missing.push(dir.to_string()),
                _ => return Err(BackendError::operation("mkdir", dir, "not a directory")),
            }
            current = remote_parent(dir);
        }
        for dir in missing.into_iter().rev() {
            debug!(dir, "ftp mkdir");
            self.stream()?
                .mkdir(&dir)
                .map_err(|e| classify("mkdir", &dir, e))?;
        }
        Ok(())
    }

    fn remove_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        debug!(path, recursive, "ftp rmdir");
        if recursive {
            return self.remove_tree(path);
        }
        self.stream()?
            .rmdir(path)
            .map_err(|e| classify("rmdir", path, e))
    }

    fn remove_file(&mut self, path: &str) -> BackendResult<()> {
        debug!(path, "ftp rm");
        self.stream()?
            .rm(path)
            .map_err(|e| classify("rm", path, e))
    }

    fn rename(&mut self, from: &str, to: &str) -> BackendResult<()> {
        debug!(from, to, "ftp rename");
        self.stream()?
            .rename(from, to)
            .map_err(|e| classify("rename", from, e))
    }

    fn close(&mut self) -> BackendResult<()> {
        self.state = ConnectionState::Disconnected;
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        info!("closing ftp session");
        stream
            .quit()
            .map_err(|e| BackendError::operation("quit", "", e))
    }
}

impl Drop for FtpBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
