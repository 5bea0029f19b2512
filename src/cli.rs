use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chain-stats-bot", version, about = "Network stats in voice channel names")]
pub struct Cli {
    /// Configuration file path (optional; defaults and environment apply without it)
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Connect and refresh the stat channels on a timer (default)
    Start,

    /// Run a single refresh over all communities, then exit
    Once,

    /// Test configuration validity
    Test,

    /// Show version information
    Version,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}
