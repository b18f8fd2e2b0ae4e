//! recordharvest binary
//!
//! Parses the command line, installs the log subscriber and maps failures
//! onto exit codes.

use clap::Parser;
use recordharvest::cli::{Cli, Runner};
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; logs go to stderr so `probe` output stays clean
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(failure) = Runner::new(cli).run().await {
        let kind = failure.kind();
        eprintln!("Error ({kind}): {failure}");
        std::process::exit(kind.exit_code());
    }
}
