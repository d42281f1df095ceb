// Library interface for tokenscope-cli; the binary and the integration
// tests both go through it.

pub mod app;
pub mod commands;
pub mod render;

// Re-export commonly used items for easier testing
pub use commands::{handle_command, CommandResult};
