//! Deploy Module
//!
//! The execution driver: connect, run a compiled batch in order, close.
//!
//! ## Structure
//!
//! - `options` - Scope and ignore rules (`DeployOptions`)
//! - `result` - Run report (`DeployReport`, `DeployPhase`)
//! - `use_case` - Driver logic (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use ferry::application::deploy::{DeployOptions, DeployUseCase};
//!
//! let mut use_case = DeployUseCase::new(backend);
//! let report = use_case.execute(&endpoint, &batch, &DeployOptions::new());
//! ```

mod options;
mod result;
mod use_case;

pub use options::DeployOptions;
pub use result::{DeployPhase, DeployReport};
pub use use_case::DeployUseCase;
