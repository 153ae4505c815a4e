//! Domain Entities
//!
//! - `TransferOperation` - One compiled unit of work (verb + paths)
//! - `ActionBatch` - Ordered operations, executed strictly in sequence
//! - `Outcome` - Result of an action or of one transfer within it

mod operation;
mod outcome;

pub use operation::{ActionBatch, TransferOperation, UnknownVerb, Verb};
pub use outcome::Outcome;
