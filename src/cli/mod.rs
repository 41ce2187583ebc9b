//! Command-line interface for cinevault.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::{cmd_import_movies, cmd_promote};

/// cinevault - movie streaming backend
#[derive(Parser)]
#[command(name = "cinevault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Create a default config.toml
    Init,

    /// Grant the admin role to an existing account
    Promote {
        /// Email of the account
        email: String,
    },

    /// Insert movies from a JSON array, skipping ids already present
    #[command(name = "import-movies")]
    ImportMovies {
        /// Path to the JSON file
        file: PathBuf,
    },
}
