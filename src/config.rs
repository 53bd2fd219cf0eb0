//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "timer-deck")]
#[command(about = "Categorised countdown timers driven by a shared clock")]
#[command(version = "1.0.0")]
pub struct Config {
    /// File the timer state is saved to
    #[arg(short, long, env = "TIMER_STATE_FILE", default_value = "timers.json")]
    pub state_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the clock and log timer events until interrupted
    Run,
    /// Add a timer
    Add {
        name: String,
        /// Duration in seconds
        duration: u64,
        category: String,
    },
    /// Start a timer
    Start { id: u64 },
    /// Pause a running timer
    Pause { id: u64 },
    /// Reset a timer to its full duration
    Reset { id: u64 },
    /// Mark a timer as completed now
    Complete { id: u64 },
    /// Start every timer in a category
    StartAll { category: String },
    /// Pause every running timer in a category
    PauseAll { category: String },
    /// Resume every paused timer in a category
    ResumeAll { category: String },
    /// Reset every timer in a category
    ResetAll { category: String },
    /// List timers grouped by category
    List,
    /// Show completed timers, oldest first
    History,
    /// Remove all timers, keeping history
    Clear,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
