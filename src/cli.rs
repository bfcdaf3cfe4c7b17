//! Command-line interface definition for thirdbrain
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot prompts, and
//! session management.

use clap::{Parser, Subcommand};

/// thirdbrain - multi-session chat client for Ollama-compatible endpoints
///
/// Hold conversations with a remote language model, keep several
/// independent sessions, and stream responses as they arrive.
#[derive(Parser, Debug, Clone)]
#[command(name = "thirdbrain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the session database location
    ///
    /// The database is locked while a thirdbrain process has it open, so a
    /// second process on the same path fails; use --ephemeral for that.
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Keep sessions in memory only; nothing is written to disk
    ///
    /// Also works while another thirdbrain process holds the database.
    #[arg(long)]
    pub ephemeral: bool,

    /// Override the model name from config
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the endpoint base URL from config
    #[arg(long)]
    pub base_url: Option<String>,

    /// Wait for the whole response instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for thirdbrain
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat
    Chat {
        /// Session to open (full id or unique prefix); defaults to the most recent
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single prompt and print the response
    Ask {
        /// Prompt text
        prompt: String,

        /// Session to send into (full id or unique prefix)
        #[arg(short, long, conflicts_with = "new")]
        session: Option<String>,

        /// Start a new session for this prompt
        #[arg(long)]
        new: bool,
    },

    /// Manage stored sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// List stored sessions
    List,

    /// Print the messages of a session
    Show {
        /// Session id (full id or unique prefix)
        id: String,
    },

    /// Create a new empty session
    New,

    /// Delete a session
    Delete {
        /// Session id (full id or unique prefix)
        id: String,
    },

    /// Reset a session to just its system message
    Clear {
        /// Session id (full id or unique prefix); defaults to the most recent
        id: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
