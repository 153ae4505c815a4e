//! Error types for ferry
//!
//! Library errors are `thiserror` enums; the binary wraps them in `anyhow`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::ports::BackendError;
use crate::domain::services::CompileError;

/// Result type alias for ferry operations
pub type FerryResult<T> = Result<T, FerryError>;

/// Main error type for ferry operations
#[derive(Error, Debug)]
pub enum FerryError {
    /// Configuration rejected before connecting
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Action input could not be compiled
    #[error("invalid actions: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FerryError {
    /// Raised before anything touched the remote side
    pub fn is_usage_error(&self) -> bool {
        matches!(self, FerryError::Config(_) | FerryError::Compile(_))
    }
}
