pub mod deploy;
pub mod inputs;
pub mod plan;
