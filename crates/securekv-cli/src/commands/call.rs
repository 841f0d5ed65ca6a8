//! Raw call command.

use securekv_core::config::Config;
use securekv_storage::{AsyncDispatcher, Dispatcher, Request};

use super::ensure_success;

/// Parse `arguments` as a JSON object; absent means no arguments.
pub fn build_request(method: &str, arguments: Option<&str>) -> anyhow::Result<Request> {
    let arguments = match arguments {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Arguments are not valid JSON: {}", e))?,
        None => serde_json::Value::Null,
    };
    Ok(Request::new(method).with_arguments(arguments))
}

/// Run the call command and print the response as JSON.
pub async fn run(config: &Config, method: &str, arguments: Option<&str>) -> anyhow::Result<()> {
    let request = build_request(method, arguments)?;
    let dispatcher = Dispatcher::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to open vault: {}", e))?;

    let response = AsyncDispatcher::new(dispatcher).handle(request).await;
    println!("{}", serde_json::to_string(&response)?);
    ensure_success(method, &response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_request() {
        let request = build_request("write", Some(r#"{"key": "k", "value": "v"}"#)).unwrap();
        assert_eq!(request.method, "write");
        assert_eq!(request.arguments, json!({"key": "k", "value": "v"}));

        let bare = build_request("deleteAll", None).unwrap();
        assert!(bare.arguments.is_null());
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(build_request("read", Some("{key: k")).is_err());
    }
}
