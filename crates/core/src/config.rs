use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "seafoodtruck.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub food_truck_api: FoodTruckApiConfig,
    pub broadcast: BroadcastConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub bot_token: SecretString,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct FoodTruckApiConfig {
    pub scheme: String,
    pub host: String,
    pub base_path: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl FoodTruckApiConfig {
    /// `scheme://host/base_path` with no trailing slash.
    pub fn base_url(&self) -> String {
        let base_path = self.base_path.trim_matches('/');
        if base_path.is_empty() {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}/{base_path}", self.scheme, self.host)
        }
    }
}

#[derive(Clone, Debug)]
pub struct BroadcastConfig {
    pub channel: Option<String>,
    pub location_ids: Vec<String>,
    pub hour: u32,
    pub minute: u32,
    pub weekdays_only: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_api_base_url: Option<String>,
    pub food_truck_api_base_url: Option<String>,
    pub broadcast_channel: Option<String>,
    pub broadcast_location_ids: Option<Vec<String>>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                bot_token: String::new().into(),
                api_base_url: "https://slack.com/api".to_string(),
            },
            food_truck_api: FoodTruckApiConfig {
                scheme: "https".to_string(),
                host: "www.seattlefoodtruck.com".to_string(),
                base_path: "/api".to_string(),
                timeout_secs: 10,
                user_agent: format!("seafoodtruck-slack/{}", env!("CARGO_PKG_VERSION")),
            },
            broadcast: BroadcastConfig {
                channel: None,
                location_ids: Vec::new(),
                hour: 8,
                minute: 0,
                weekdays_only: true,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                graceful_shutdown_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides)?;
        config.validate()?;

        Ok(config)
    }

    pub fn has_bot_token(&self) -> bool {
        !self.slack.bot_token.expose_secret().trim().is_empty()
    }

    /// The scheduled broadcast needs a token to post with, a channel to post
    /// to and at least one location to report on.
    pub fn broadcast_ready(&self) -> bool {
        self.has_bot_token()
            && self.broadcast.channel.as_deref().is_some_and(|channel| !channel.trim().is_empty())
            && !self.broadcast.location_ids.is_empty()
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(slack_bot_token_value) = slack.bot_token {
                self.slack.bot_token = secret_value(slack_bot_token_value);
            }
            if let Some(api_base_url) = slack.api_base_url {
                self.slack.api_base_url = api_base_url;
            }
        }

        if let Some(api) = patch.food_truck_api {
            if let Some(scheme) = api.scheme {
                self.food_truck_api.scheme = scheme;
            }
            if let Some(host) = api.host {
                self.food_truck_api.host = host;
            }
            if let Some(base_path) = api.base_path {
                self.food_truck_api.base_path = base_path;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.food_truck_api.timeout_secs = timeout_secs;
            }
            if let Some(user_agent) = api.user_agent {
                self.food_truck_api.user_agent = user_agent;
            }
        }

        if let Some(broadcast) = patch.broadcast {
            if let Some(channel) = broadcast.channel {
                self.broadcast.channel = Some(channel);
            }
            if let Some(location_ids) = broadcast.location_ids {
                self.broadcast.location_ids = normalize_location_ids(location_ids);
            }
            if let Some(hour) = broadcast.hour {
                self.broadcast.hour = hour;
            }
            if let Some(minute) = broadcast.minute {
                self.broadcast.minute = minute;
            }
            if let Some(weekdays_only) = broadcast.weekdays_only {
                self.broadcast.weekdays_only = weekdays_only;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SEAFOODTRUCK_SLACK_BOT_TOKEN").or_else(|| read_env("TOKEN"))
        {
            self.slack.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("SEAFOODTRUCK_SLACK_API_BASE_URL") {
            self.slack.api_base_url = value;
        }

        if let Some(value) = read_env("SEAFOODTRUCK_API_SCHEME") {
            self.food_truck_api.scheme = value;
        }
        if let Some(value) = read_env("SEAFOODTRUCK_API_HOST") {
            self.food_truck_api.host = value;
        }
        if let Some(value) = read_env("SEAFOODTRUCK_API_BASE_PATH") {
            self.food_truck_api.base_path = value;
        }
        if let Some(value) = read_env("SEAFOODTRUCK_API_TIMEOUT_SECS") {
            self.food_truck_api.timeout_secs = parse_u64("SEAFOODTRUCK_API_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) =
            read_env("SEAFOODTRUCK_BROADCAST_CHANNEL").or_else(|| read_env("CHANNEL"))
        {
            self.broadcast.channel = Some(value);
        }
        if let Some(value) =
            read_env("SEAFOODTRUCK_BROADCAST_LOCATION_IDS").or_else(|| read_env("LOCATION_IDS"))
        {
            self.broadcast.location_ids = split_location_ids(&value);
        }
        if let Some(value) = read_env("SEAFOODTRUCK_BROADCAST_HOUR") {
            self.broadcast.hour = parse_u32("SEAFOODTRUCK_BROADCAST_HOUR", &value)?;
        }
        if let Some(value) = read_env("SEAFOODTRUCK_BROADCAST_MINUTE") {
            self.broadcast.minute = parse_u32("SEAFOODTRUCK_BROADCAST_MINUTE", &value)?;
        }
        if let Some(value) = read_env("SEAFOODTRUCK_BROADCAST_WEEKDAYS_ONLY") {
            self.broadcast.weekdays_only =
                parse_bool("SEAFOODTRUCK_BROADCAST_WEEKDAYS_ONLY", &value)?;
        }

        if let Some(value) = read_env("SEAFOODTRUCK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some((key, value)) = read_env_pair("SEAFOODTRUCK_SERVER_PORT", "PORT") {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env("SEAFOODTRUCK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SEAFOODTRUCK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SEAFOODTRUCK_LOGGING_LEVEL").or_else(|| read_env("SEAFOODTRUCK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("SEAFOODTRUCK_LOGGING_FORMAT")
            .or_else(|| read_env("SEAFOODTRUCK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(slack_bot_token);
        }
        if let Some(slack_api_base_url) = overrides.slack_api_base_url {
            self.slack.api_base_url = slack_api_base_url;
        }
        if let Some(base_url) = overrides.food_truck_api_base_url {
            let (scheme, host, base_path) = split_base_url(&base_url)?;
            self.food_truck_api.scheme = scheme;
            self.food_truck_api.host = host;
            self.food_truck_api.base_path = base_path;
        }
        if let Some(channel) = overrides.broadcast_channel {
            self.broadcast.channel = Some(channel);
        }
        if let Some(location_ids) = overrides.broadcast_location_ids {
            self.broadcast.location_ids = normalize_location_ids(location_ids);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_food_truck_api(&self.food_truck_api)?;
        validate_broadcast(&self.broadcast)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

/// Comma-separated ids, as in `LOCATION_IDS=123,westlake-park`.
pub fn split_location_ids(raw: &str) -> Vec<String> {
    normalize_location_ids(raw.split(',').map(str::to_owned).collect())
}

fn normalize_location_ids(ids: Vec<String>) -> Vec<String> {
    ids.into_iter()
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .collect()
}

fn split_base_url(base_url: &str) -> Result<(String, String, String), ConfigError> {
    let invalid = || {
        ConfigError::Validation(format!(
            "food_truck_api base url `{base_url}` must look like `https://host/base-path`"
        ))
    };
    let (scheme, rest) = base_url.trim().split_once("://").ok_or_else(invalid)?;
    let (host, base_path) = match rest.split_once('/') {
        Some((host, path)) => (host, format!("/{}", path.trim_end_matches('/'))),
        None => (rest, String::new()),
    };
    if scheme.is_empty() || host.is_empty() {
        return Err(invalid());
    }
    Ok((scheme.to_owned(), host.to_owned(), base_path))
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let bot_token = slack.bot_token.expose_secret();
    if !bot_token.is_empty() && !bot_token.starts_with("xoxb-") {
        return Err(ConfigError::Validation(
            "slack.bot_token must start with `xoxb-`. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string(),
        ));
    }

    if !slack.api_base_url.starts_with("http://") && !slack.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "slack.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_food_truck_api(api: &FoodTruckApiConfig) -> Result<(), ConfigError> {
    if api.scheme != "http" && api.scheme != "https" {
        return Err(ConfigError::Validation(
            "food_truck_api.scheme must be http or https".to_string(),
        ));
    }

    if api.host.trim().is_empty() {
        return Err(ConfigError::Validation("food_truck_api.host is required".to_string()));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "food_truck_api.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_broadcast(broadcast: &BroadcastConfig) -> Result<(), ConfigError> {
    if broadcast.hour > 23 {
        return Err(ConfigError::Validation(
            "broadcast.hour must be in range 0..=23".to_string(),
        ));
    }

    if broadcast.minute > 59 {
        return Err(ConfigError::Validation(
            "broadcast.minute must be in range 0..=59".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_pair(
    primary: &'static str,
    alias: &'static str,
) -> Option<(&'static str, String)> {
    read_env(primary)
        .map(|value| (primary, value))
        .or_else(|| read_env(alias).map(|value| (alias, value)))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    food_truck_api: Option<FoodTruckApiPatch>,
    broadcast: Option<BroadcastPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    bot_token: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FoodTruckApiPatch {
    scheme: Option<String>,
    host: Option<String>,
    base_path: Option<String>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BroadcastPatch {
    channel: Option<String>,
    location_ids: Option<Vec<String>>,
    hour: Option<u32>,
    minute: Option<u32>,
    weekdays_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
