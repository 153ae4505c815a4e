//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `backends/` - Remote backends (FTP, SFTP, in-memory)
//! - `events/` - Deploy event sinks (console, NDJSON)

pub mod backends;
pub mod events;

pub use backends::{for_protocol, FtpBackend, MemoryBackend, SftpBackend};
pub use events::{ConsoleEventSink, ConsoleStyle, JsonEventSink};
