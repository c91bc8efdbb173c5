//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for a session run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every event as it happens, then the full summary
    Full,
    /// Only the content brief
    Brief,
    /// The summary as JSON
    Json,
}

impl From<OutputFormat> for huddle_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => huddle_domain::OutputFormat::Full,
            OutputFormat::Brief => huddle_domain::OutputFormat::Brief,
            OutputFormat::Json => huddle_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for huddle
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(author, version, about = "Real-time ideation sessions with an AI collaborator")]
#[command(long_about = r#"
Huddle runs collaborative ideation sessions: participants contribute ideas,
vote on them, and an assistant chimes in with grounded suggestions. When the
session ends a deterministic summary is produced.

Configuration files are loaded from (in priority order):
1. HUDDLE_<SECTION>__<KEY> environment variables
2. --config <path>     Explicit config file
3. ./huddle.toml       Project-level config
4. ~/.config/huddle/config.toml   Global config

Example:
  huddle simulate --participants 4 --ideas 12
  huddle -vv simulate --format full --title "Q3 retro"
  huddle --show-config
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write daily-rotated log files to this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Output format (overrides [output].format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a scripted session end to end with the offline adapters
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Session title
    #[arg(long, default_value = "Simulated huddle")]
    pub title: String,

    /// Workspace the session belongs to
    #[arg(long, default_value = "local")]
    pub workspace: String,

    /// Number of participants (the first one opens the session)
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub participants: u16,

    /// Number of ideas to contribute
    #[arg(short, long, default_value_t = 10)]
    pub ideas: usize,

    /// Also ask the assistant explicitly once the ideas are in
    #[arg(long)]
    pub request_assistant: bool,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            title: "Simulated huddle".to_string(),
            workspace: "local".to_string(),
            participants: 3,
            ideas: 10,
            request_assistant: false,
        }
    }
}
