//! Domain Layer
//!
//! The core of Ferry - deployment rules without network dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Core domain entities (TransferOperation, ActionBatch, Outcome)
//! - `value_objects/` - Immutable value types (Endpoint, RemoteEntry, IgnoreFilter, LocalScope)
//! - `services/` - Domain services (Action Compiler)
//! - `ports/` - Interface definitions for infrastructure (RemoteBackend, DeployEventSink)
//!
//! ## Design Principles
//!
//! 1. **No network I/O** - Remote access only goes through the `RemoteBackend` port
//! 2. **Pure Functions** - The compiler is stateless and testable
//! 3. **Ports & Adapters** - Protocols and reporting are trait-defined ports

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
