//! Command-line interface for caro.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Caro - five-in-a-row against the bot or a peer
#[derive(Parser, Debug)]
#[command(name = "caro")]
#[command(about = "Play five-in-a-row in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML client configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play against the built-in bot
    Bot,

    /// Wait for one peer to connect, then play (you open the first round)
    Host {
        /// Port to listen on
        #[arg(short, long, default_value = "7777")]
        port: u16,
    },

    /// Connect to a hosting peer and play (the host opens the first round)
    Join {
        /// Host address, e.g. 127.0.0.1:7777
        #[arg(short, long)]
        addr: String,
    },
}
