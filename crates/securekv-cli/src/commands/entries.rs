//! Entry commands: `contains`, `read`, `read-all`, `write`, `delete`, `delete-all`.

use securekv_core::config::Config;
use securekv_core::SecretString;
use securekv_storage::{Arguments, AsyncDispatcher, Dispatcher, Method, Payload};

use super::ensure_success;
use crate::Commands;

/// Translate an entry command into a call.
///
/// Flags that were not given stay absent so configured defaults apply.
pub fn to_call(command: Commands) -> anyhow::Result<(Method, Arguments)> {
    let flag = |set: bool| set.then_some(true);

    let call = match command {
        Commands::Contains { key } => (
            Method::ContainsKey,
            Arguments {
                key: Some(key),
                ..Default::default()
            },
        ),
        Commands::Read {
            key,
            synchronizable,
            access_control,
        } => (
            Method::Read,
            Arguments {
                key: Some(key),
                synchronizable: flag(synchronizable),
                access_control,
                ..Default::default()
            },
        ),
        Commands::ReadAll {
            synchronizable,
            accessibility,
        } => (
            Method::ReadAll,
            Arguments {
                synchronizable: flag(synchronizable),
                accessibility,
                ..Default::default()
            },
        ),
        Commands::Write {
            key,
            value,
            accessibility,
            synchronizable,
            access_control,
        } => {
            let value = match value {
                Some(v) => v,
                None => {
                    let prompt = format!("Enter value for '{key}': ");
                    rpassword::prompt_password(prompt)
                        .map_err(|e| anyhow::anyhow!("Failed to read value: {}", e))?
                }
            };
            (
                Method::Write,
                Arguments {
                    key: Some(key),
                    value: Some(SecretString::new(value)),
                    accessibility,
                    synchronizable: flag(synchronizable),
                    access_control,
                    ..Default::default()
                },
            )
        }
        Commands::Delete {
            key,
            synchronizable,
        } => (
            Method::Delete,
            Arguments {
                key: Some(key),
                synchronizable: flag(synchronizable),
                ..Default::default()
            },
        ),
        Commands::DeleteAll { synchronizable } => (
            Method::DeleteAll,
            Arguments {
                synchronizable: flag(synchronizable),
                ..Default::default()
            },
        ),
        _ => anyhow::bail!("not an entry command"),
    };
    Ok(call)
}

/// Run an entry command against the configured vault.
pub async fn run(config: &Config, command: Commands) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to open vault: {}", e))?;
    let dispatcher = AsyncDispatcher::new(dispatcher);

    let (method, arguments) = to_call(command)?;
    let key = arguments.key.clone().unwrap_or_default();
    let response = dispatcher.call(method, arguments).await;
    ensure_success(method.as_str(), &response)?;

    match (method, &response.value) {
        (Method::ContainsKey, Payload::Bool(found)) => println!("{found}"),
        (Method::Read, Payload::Text(value)) => println!("{}", value.expose_secret()),
        (Method::Read, _) => eprintln!("No entry for '{key}'."),
        (Method::ReadAll, Payload::Map(entries)) => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        (Method::Write, _) => eprintln!("Stored '{key}'."),
        (Method::Delete, _) => eprintln!("Deleted '{key}'."),
        (Method::DeleteAll, _) => eprintln!("Deleted all entries."),
        _ => {}
    }

    Ok(())
}
