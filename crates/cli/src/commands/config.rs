use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use seafoodtruck_core::config::{AppConfig, LoadOptions, CONFIG_FILE_NAME};
use secrecy::ExposeSecret;
use toml::Value;

/// One reported field: dotted key, rendered value and the env vars that can
/// set it, in precedence order.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let broadcast = &config.broadcast;
    vec![
        Field {
            key: "slack.bot_token",
            value: redact_token(config.slack.bot_token.expose_secret()),
            env_keys: &["SEAFOODTRUCK_SLACK_BOT_TOKEN", "TOKEN"],
        },
        Field {
            key: "slack.api_base_url",
            value: config.slack.api_base_url.clone(),
            env_keys: &["SEAFOODTRUCK_SLACK_API_BASE_URL"],
        },
        Field {
            key: "food_truck_api.base_url",
            value: config.food_truck_api.base_url(),
            env_keys: &[
                "SEAFOODTRUCK_API_SCHEME",
                "SEAFOODTRUCK_API_HOST",
                "SEAFOODTRUCK_API_BASE_PATH",
            ],
        },
        Field {
            key: "food_truck_api.timeout_secs",
            value: config.food_truck_api.timeout_secs.to_string(),
            env_keys: &["SEAFOODTRUCK_API_TIMEOUT_SECS"],
        },
        Field {
            key: "broadcast.channel",
            value: broadcast.channel.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["SEAFOODTRUCK_BROADCAST_CHANNEL", "CHANNEL"],
        },
        Field {
            key: "broadcast.location_ids",
            value: if broadcast.location_ids.is_empty() {
                "<none>".to_string()
            } else {
                broadcast.location_ids.join(",")
            },
            env_keys: &["SEAFOODTRUCK_BROADCAST_LOCATION_IDS", "LOCATION_IDS"],
        },
        Field {
            key: "broadcast.time",
            value: format!(
                "{:02}:{:02}{}",
                broadcast.hour,
                broadcast.minute,
                if broadcast.weekdays_only { " (weekdays)" } else { "" }
            ),
            env_keys: &["SEAFOODTRUCK_BROADCAST_HOUR", "SEAFOODTRUCK_BROADCAST_MINUTE"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["SEAFOODTRUCK_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["SEAFOODTRUCK_SERVER_PORT", "PORT"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SEAFOODTRUCK_LOGGING_LEVEL", "SEAFOODTRUCK_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["SEAFOODTRUCK_LOGGING_FORMAT", "SEAFOODTRUCK_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        // Derived keys like `broadcast.time` count as file-sourced when their
        // section is present.
        let section = key_path.split('.').next().unwrap_or(key_path);
        if contains_path(doc, key_path) || (key_path.ends_with(".time") && doc.get(section).is_some())
        {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
