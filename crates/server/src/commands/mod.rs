//! Command handlers for the `comai` binary.

pub mod ask;
pub mod serve;

pub use ask::AskCommand;
pub use serve::ServeCommand;
