//! Domain Services
//!
//! Pure business logic services that operate on domain entities.
//! These services have no I/O dependencies and are easily testable.

mod change_set;
mod compiler;
mod tokenizer;

pub use change_set::REVISION_FILE;
pub use compiler::{compile, CompileError, Location};
pub use tokenizer::{tokenize, TokenizeError};
