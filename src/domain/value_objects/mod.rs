//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod endpoint;
mod ignore_filter;
mod path;
mod remote_entry;

pub use endpoint::{ConnectionState, Endpoint, Protocol};
pub use ignore_filter::{IgnoreFilter, IgnoreFilterError};
pub use path::{remote_file_name, remote_join, remote_parent, to_remote_path, LocalScope};
pub(crate) use path::normalize_local;
pub use remote_entry::{EntryKind, RemoteEntry};
