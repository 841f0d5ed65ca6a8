//! SecureKV CLI entry point.

use clap::Parser;
use securekv_cli::{init_logging, run, Cli};
use securekv_core::config::{Config, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; a broken config file is reported by the command itself
    let filter = Config::load_or_default(cli.config.as_deref())
        .map(|config| config.logging.filter)
        .unwrap_or_else(|_| LoggingConfig::default().filter);
    init_logging(cli.verbose, &filter);

    // Run the command
    run(cli).await
}
