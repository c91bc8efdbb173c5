//! Presentation layer for huddle
//!
//! This crate contains the CLI definition and the console formatter for
//! session events and summaries.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat, SimulateArgs};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
