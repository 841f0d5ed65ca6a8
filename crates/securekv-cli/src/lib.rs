//! SecureKV command-line interface.

pub mod commands;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use securekv_core::config::{BackendKind, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// SecureKV - policy-aware credential storage
#[derive(Parser)]
#[command(name = "securekv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "SECUREKV_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Vault backend (auto, memory, file, keychain)
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Location of the file-backed vault
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    /// Access group (groupId)
    #[arg(long, global = true)]
    pub group: Option<String>,

    /// Service account namespace (accountName)
    #[arg(long, global = true)]
    pub account: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check whether an entry exists
    Contains {
        /// Entry key
        key: String,
    },

    /// Print the value stored under a key
    Read {
        /// Entry key
        key: String,

        /// Read from the synchronizable partition
        #[arg(long)]
        synchronizable: bool,

        /// Access control the entry was written with; prompts for authentication
        #[arg(long)]
        access_control: Option<String>,
    },

    /// Print every entry as a JSON object
    ReadAll {
        /// List the synchronizable partition
        #[arg(long)]
        synchronizable: bool,

        /// Only list entries with this accessibility
        #[arg(long)]
        accessibility: Option<String>,
    },

    /// Store a value (prompts for it when --value is omitted)
    Write {
        /// Entry key
        key: String,

        /// Value to store (if omitted, prompts for hidden input)
        #[arg(long)]
        value: Option<String>,

        /// passcode, unlocked, unlocked_this_device, first_unlock, first_unlock_this_device
        #[arg(long)]
        accessibility: Option<String>,

        /// Store in the synchronizable partition
        #[arg(long)]
        synchronizable: bool,

        /// user_presence, biometry_any, biometry_current_set, device_passcode
        #[arg(long)]
        access_control: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry key
        key: String,

        /// Delete from the synchronizable partition
        #[arg(long)]
        synchronizable: bool,
    },

    /// Delete every entry in the group/account scope
    DeleteAll {
        /// Delete from the synchronizable partition
        #[arg(long)]
        synchronizable: bool,
    },

    /// Send a raw call and print the JSON response
    Call {
        /// Method name (containsKey, read, readAll, write, delete, deleteAll)
        method: String,

        /// Arguments as a JSON object
        arguments: Option<String>,
    },

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `-v` raises the level above `default_filter`.
pub fn init_logging(verbose: u8, default_filter: &str) {
    let directive = match verbose {
        0 => default_filter.to_string(),
        1 => "securekv=debug".to_string(),
        _ => "securekv=trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load the configuration and apply command-line overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load config")?;

    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
    if let Some(path) = &cli.path {
        config.storage.path = Some(path.clone());
    }
    if let Some(group) = &cli.group {
        config.defaults.group_id = Some(group.clone());
    }
    if let Some(account) = &cli.account {
        config.defaults.account_name = Some(account.clone());
    }
    Ok(config)
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version => {
            println!("securekv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Config(ref args) => commands::config::run(&cli, args),
        Commands::Call {
            ref method,
            ref arguments,
        } => {
            let config = load_config(&cli)?;
            commands::call::run(&config, method, arguments.as_deref()).await
        }
        _ => {
            let config = load_config(&cli)?;
            commands::entries::run(&config, cli.command).await
        }
    }
}
