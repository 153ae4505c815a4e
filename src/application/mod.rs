//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `DeployUseCase` - Connects, runs a compiled batch in order, closes
//!
//! ## Services
//!
//! - `SyncEngine` - Directory mirroring and single-target operations

pub mod deploy;
pub mod sync;

pub use deploy::{DeployOptions, DeployPhase, DeployReport, DeployUseCase};
pub use sync::{SyncEngine, SyncResult, Tally};
