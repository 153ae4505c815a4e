//! SFTP backend (ssh2)
//!
//! Authenticates with private-key material when given (falling back to the
//! password if the key is refused), otherwise with the password. Directory
//! trees move in bulk through `upload_tree` / `download_tree`.

use std::fs;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::{ErrorCode, FileStat, Session, Sftp};
use tracing::{debug, info};

use crate::domain::ports::{
    BackendError, BackendResult, ConnectResult, RemoteBackend, TreeReport, TreeTransfer,
};
use crate::domain::value_objects::{
    remote_join, remote_parent, ConnectionState, Endpoint, EntryKind, RemoteEntry,
};

// libssh2 session error codes that mean the transport is gone
const LIBSSH2_ERROR_SOCKET_SEND: i32 = -7;
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_SOCKET_DISCONNECT: i32 = -13;
const LIBSSH2_ERROR_SOCKET_TIMEOUT: i32 = -30;
const LIBSSH2_ERROR_SOCKET_RECV: i32 = -43;

const DIR_MODE: i32 = 0o755;

struct Connection {
    session: Session,
    sftp: Sftp,
}

pub struct SftpBackend {
    connection: Option<Connection>,
    state: ConnectionState,
}

impl Default for SftpBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SftpBackend {
    pub fn new() -> Self {
        Self {
            connection: None,
            state: ConnectionState::Disconnected,
        }
    }

    fn sftp(&self) -> BackendResult<&Sftp> {
        self.connection
            .as_ref()
            .map(|c| &c.sftp)
            .ok_or(BackendError::NotConnected)
    }

    fn open_session(endpoint: &Endpoint) -> Result<Connection, String> {
        let tcp = TcpStream::connect(endpoint.address())
            .map_err(|e| format!("cannot reach {}: {}", endpoint.address(), e))?;

        let mut session = Session::new().map_err(|e| e.to_string())?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| format!("SSH handshake failed: {}", e))?;

        authenticate(&session, endpoint)?;

        let sftp = session
            .sftp()
            .map_err(|e| format!("SFTP subsystem unavailable: {}", e))?;
        Ok(Connection { session, sftp })
    }

    /// Create every missing directory along `path`
    fn mkdir_all(&self, path: &str) -> BackendResult<()> {
        let sftp = self.sftp()?;
        let mut missing = Vec::new();
        let mut current = Some(path);
        while let Some(dir) = current {
            match sftp.stat(Path::new(dir)) {
                Ok(stat) if stat.is_dir() => break,
                Ok(_) => return Err(BackendError::operation("mkdir", dir, "not a directory")),
                Err(_) => missing.push(dir),
            }
            current = remote_parent(dir);
        }
        for dir in missing.into_iter().rev() {
            debug!(dir, "sftp mkdir");
            sftp.mkdir(Path::new(dir), DIR_MODE)
                .map_err(|e| classify("mkdir", dir, e))?;
        }
        Ok(())
    }

    fn remove_tree(&self, dir: &str) -> BackendResult<()> {
        let sftp = self.sftp()?;
        let entries = sftp
            .readdir(Path::new(dir))
            .map_err(|e| classify("readdir", dir, e))?;
        for (path, stat) in entries {
            let child = path.to_string_lossy().into_owned();
            if entry_kind(&stat) == EntryKind::Directory {
                self.remove_tree(&child)?;
            } else {
                sftp.unlink(&path).map_err(|e| classify("rm", &child, e))?;
            }
        }
        sftp.rmdir(Path::new(dir))
            .map_err(|e| classify("rmdir", dir, e))
    }

    fn upload_dir(
        &self,
        local: &Path,
        remote: &str,
        report: &mut TreeReport,
    ) -> BackendResult<()> {
        let sftp = self.sftp()?;
        let mut entries = fs::read_dir(local)
            .and_then(|rd| rd.collect::<io::Result<Vec<_>>>())
            .map_err(|e| BackendError::local_io(local, e))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let target = remote_join(remote, &entry.file_name().to_string_lossy());
            let meta = fs::metadata(&path).map_err(|e| BackendError::local_io(&path, e))?;
            if meta.is_dir() {
                self.mkdir_all(&target)?;
                self.upload_dir(&path, &target, report)?;
            } else {
                let mut file =
                    fs::File::open(&path).map_err(|e| BackendError::local_io(&path, e))?;
                let mut remote_file = sftp
                    .create(Path::new(&target))
                    .map_err(|e| classify("put", &target, e))?;
                io::copy(&mut file, &mut remote_file)
                    .map_err(|e| BackendError::operation("put", &target, e))?;
                report.files.push(target);
            }
        }
        Ok(())
    }

    fn download_dir(
        &self,
        remote: &str,
        local: &Path,
        report: &mut TreeReport,
    ) -> BackendResult<()> {
        let sftp = self.sftp()?;
        fs::create_dir_all(local).map_err(|e| BackendError::local_io(local, e))?;
        let mut entries = sftp
            .readdir(Path::new(remote))
            .map_err(|e| classify("readdir", remote, e))?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, stat) in entries {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = remote_join(remote, &name);
            let target = local.join(&name);
            match entry_kind(&stat) {
                EntryKind::Directory => self.download_dir(&source, &target, report)?,
                EntryKind::File => {
                    let mut remote_file = sftp
                        .open(Path::new(&source))
                        .map_err(|e| classify("get", &source, e))?;
                    let mut file = fs::File::create(&target)
                        .map_err(|e| BackendError::local_io(&target, e))?;
                    io::copy(&mut remote_file, &mut file)
                        .map_err(|e| BackendError::operation("get", &source, e))?;
                    report.files.push(source);
                }
                _ => {
                    debug!(path = %source, "skipping symlink");
                    report.symlinks.push(source);
                }
            }
        }
        Ok(())
    }
}

fn authenticate(session: &Session, endpoint: &Endpoint) -> Result<(), String> {
    let mut key_error = None;
    if let Some(key) = &endpoint.private_key {
        match session.userauth_pubkey_memory(
            &endpoint.user,
            None,
            key,
            endpoint.private_key_passphrase.as_deref(),
        ) {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!(error = %e, "private key rejected");
                key_error = Some(e.to_string());
            }
        }
    }

    match &endpoint.password {
        Some(password) => session
            .userauth_password(&endpoint.user, password)
            .map_err(|e| format!("authentication failed: {}", e)),
        None => Err(format!(
            "authentication failed: {}",
            key_error.unwrap_or_else(|| "no credentials".to_string())
        )),
    }
}

fn entry_kind(stat: &FileStat) -> EntryKind {
    let file_type = stat.file_type();
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn classify(op: &'static str, path: &str, err: ssh2::Error) -> BackendError {
    match err.code() {
        ErrorCode::Session(
            LIBSSH2_ERROR_SOCKET_SEND
            | LIBSSH2_ERROR_TIMEOUT
            | LIBSSH2_ERROR_SOCKET_DISCONNECT
            | LIBSSH2_ERROR_SOCKET_TIMEOUT
            | LIBSSH2_ERROR_SOCKET_RECV,
        ) => BackendError::ConnectionLost(err.to_string()),
        _ => BackendError::operation(op, path, err),
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl RemoteBackend for SftpBackend {
    fn protocol(&self) -> &'static str {
        "sftp"
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn connect(&mut self, endpoint: &Endpoint) -> ConnectResult {
        self.state = ConnectionState::Connecting;
        info!(endpoint = %endpoint.display_name(), "connecting");
        match Self::open_session(endpoint) {
            Ok(connection) => {
                self.connection = Some(connection);
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
        let name = file_name(path);
        let Ok(sftp) = self.sftp() else {
            return RemoteEntry::absent(name);
        };
        match sftp.lstat(Path::new(path)) {
            Ok(stat) => RemoteEntry::new(name, entry_kind(&stat)),
            Err(_) => RemoteEntry::absent(name),
        }
    }

    fn list_children(&mut self, dir: &str) -> BackendResult<Vec<RemoteEntry>> {
        let entries = self
            .sftp()?
            .readdir(Path::new(dir))
            .map_err(|e| classify("readdir", dir, e))?;
        Ok(entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(RemoteEntry::new(name, entry_kind(&stat)))
            })
            .collect())
    }

    fn get_file(&mut self, remote: &str, sink: &mut dyn Write) -> BackendResult<u64> {
        debug!(remote, "sftp get");
        let mut file = self
            .sftp()?
            .open(Path::new(remote))
            .map_err(|e| classify("get", remote, e))?;
        io::copy(&mut file, sink).map_err(|e| BackendError::operation("get", remote, e))
    }

    fn put_stream(&mut self, source: &mut dyn Read, remote: &str) -> BackendResult<u64> {
        debug!(remote, "sftp put");
        let mut file = self
            .sftp()?
            .create(Path::new(remote))
            .map_err(|e| classify("put", remote, e))?;
        io::copy(source, &mut file).map_err(|e| BackendError::operation("put", remote, e))
    }

    fn make_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        if recursive {
            return self.mkdir_all(path);
        }
        self.sftp()?
            .mkdir(Path::new(path), DIR_MODE)
            .map_err(|e| classify("mkdir", path, e))
    }

    fn remove_directory(&mut self, path: &str, recursive: bool) -> BackendResult<()> {
        debug!(path, recursive, "sftp rmdir");
        if recursive {
            return self.remove_tree(path);
        }
        self.sftp()?
            .rmdir(Path::new(path))
            .map_err(|e| classify("rmdir", path, e))
    }

    fn remove_file(&mut self, path: &str) -> BackendResult<()> {
        debug!(path, "sftp rm");
        self.sftp()?
            .unlink(Path::new(path))
            .map_err(|e| classify("rm", path, e))
    }

    fn rename(&mut self, from: &str, to: &str) -> BackendResult<()> {
        debug!(from, to, "sftp rename");
        self.sftp()?
            .rename(Path::new(from), Path::new(to), None)
            .map_err(|e| classify("rename", from, e))
    }

    fn close(&mut self) -> BackendResult<()> {
        self.state = ConnectionState::Disconnected;
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        info!("closing sftp session");
        drop(connection.sftp);
        connection
            .session
            .disconnect(None, "bye", None)
            .map_err(|e| BackendError::operation("disconnect", "", e))
    }

    fn tree_transfer(&self) -> TreeTransfer {
        TreeTransfer::Bulk
    }

    fn upload_tree(&mut self, local: &Path, remote: &str) -> BackendResult<TreeReport> {
        debug!(local = %local.display(), remote, "sftp upload tree");
        self.mkdir_all(remote)?;
        let mut report = TreeReport::default();
        self.upload_dir(local, remote, &mut report)?;
        Ok(report)
    }

    fn download_tree(&mut self, remote: &str, local: &Path) -> BackendResult<TreeReport> {
        debug!(remote, local = %local.display(), "sftp download tree");
        let mut report = TreeReport::default();
        self.download_dir(remote, local, &mut report)?;
        Ok(report)
    }
}

impl Drop for SftpBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
