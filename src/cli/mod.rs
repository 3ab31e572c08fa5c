//! Command-line entry point

pub mod serve;

use clap::{Parser, Subcommand};

/// Keyrelay Gateway - access keys for a messaging relay
#[derive(Parser)]
#[command(name = "keyrelay-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,
}
