//! CLI module for Fabric
//!
//! Command-line parsing for the fabric-server binary. Uses clap for argument
//! parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fabric - multi-framework agent backend
#[derive(Parser, Debug)]
#[command(
    name = "fabric-server",
    version,
    about = "Fabric - multi-framework agent backend",
    long_about = "An authenticated HTTP backend that runs tasks on PraisonAI, CrewAI and AG2\n\
                  agent frameworks, persisting sessions and exporting Prometheus metrics.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  fabric-server                          # Start the server (reads fabric.toml)\n    \
                  fabric-server --config prod.toml       # Use a custom config file\n    \
                  fabric-server agents                   # Show which frameworks are importable\n    \
                  fabric-server token --sub user_123     # Mint a development token"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "fabric.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Probe every agent framework and print its availability
    Agents,

    /// Mint an HS256 bearer token for local development
    Token {
        /// Subject (user ID) of the token
        #[arg(long)]
        sub: String,

        /// Optional email claim
        #[arg(long)]
        email: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Only validate, print nothing on success
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
