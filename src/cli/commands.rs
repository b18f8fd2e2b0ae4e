//! CLI commands and argument parsing

use crate::config::DEFAULT_TOKEN_ENV;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Harvest records from a paginated search API into a flat table
#[derive(Parser, Debug)]
#[command(name = "recordharvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Job file (YAML)
    #[arg(short, long, global = true, default_value = "job.yaml")]
    pub config: PathBuf,

    /// Bearer token, overriding the job file
    #[arg(long, global = true, env = DEFAULT_TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full harvest and write the dataset
    Harvest {
        /// Output file, overriding the job file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (defaults to the job file, then the file extension)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Discover identifiers and print them, one per line
    Probe,

    /// Validate the job file
    Validate,

    /// Show the credential's expiry
    Token,
}
