//! CLI module
//!
//! Command-line interface for running harvest jobs.
//!
//! # Commands
//!
//! - `harvest` - Discover, resolve, flatten and write the dataset
//! - `probe` - Print the discovered identifiers, one per line
//! - `validate` - Load and validate the job file
//! - `token` - Show the credential's expiry

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
