//! Console presentation helpers

pub mod ci;
pub mod terminal;
pub mod theme;
