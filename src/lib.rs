//! ferry - deploy a local file tree to a remote server over FTP or SFTP
//!
//! A batch of transfer actions (command text or a JSON change set) is compiled
//! into an ordered `ActionBatch`, then executed against one remote backend.
//! Each action yields an outcome; per-action failures never stop the batch.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;

// Re-exports for convenience
pub use application::{DeployOptions, DeployReport, DeployUseCase};
pub use config::{DeploySettings, RawConfig};
pub use domain::entities::{ActionBatch, Outcome, TransferOperation, Verb};
pub use domain::services::compile;
pub use error::{FerryError, FerryResult};
