//! Configuration management commands.

use clap::Args;
use securekv_core::config::Config;

use crate::{load_config, Cli};

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: String,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// Look up a dot-separated path in the JSON form of `config`.
pub fn get_path(config: &Config, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let json = serde_json::to_value(config)?;
    let value = key
        .split('.')
        .fold(Some(&json), |acc, k| acc.and_then(|v| v.get(k)));
    Ok(value.cloned())
}

/// Run the config command.
pub fn run(cli: &Cli, args: &ConfigArgs) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            println!("{}", config.to_json5()?);
        }

        ConfigCommand::Get { key } => {
            let config = load_config(cli)?;
            match get_path(&config, key)? {
                Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
                None => anyhow::bail!("Key not found: {}", key),
            }
        }

        ConfigCommand::Path => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::default_path()?,
            };
            println!("{}", path.display());
        }

        ConfigCommand::Validate => {
            let config = load_config(cli)?;
            match config.validate() {
                Ok(()) => println!("Configuration is valid"),
                Err(e) => anyhow::bail!("Configuration error: {}", e),
            }
        }
    }

    Ok(())
}
