//! Remote backend adapters
//!
//! - `FtpBackend` - suppaftp, plain or explicit TLS
//! - `SftpBackend` - ssh2, password or private key
//! - `MemoryBackend` - in-process tree for tests and dry runs

mod ftp;
mod memory;
mod sftp;

pub use ftp::FtpBackend;
pub use memory::{Call, MemoryBackend};
pub use sftp::SftpBackend;

use crate::domain::ports::RemoteBackend;
use crate::domain::value_objects::Protocol;

/// Choose the backend for a protocol. Selected once per run.
pub fn for_protocol(protocol: Protocol) -> Box<dyn RemoteBackend> {
    match protocol {
        Protocol::Ftp => Box::new(FtpBackend::new()),
        Protocol::Sftp => Box::new(SftpBackend::new()),
    }
}
