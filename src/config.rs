use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use teloxide::types::ChatId;

use crate::cobalt::DEFAULT_API_URL;
use crate::download_button::DEFAULT_TIMEOUT;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_VAR: &str = "TOKEN";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// The bot token is not set.
    MissingToken,
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::MissingToken => write!(f, "{TOKEN_VAR} is not set"),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::MissingToken | Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    /// Cobalt JSON endpoint.
    api_url: Option<String>,
    /// Public cobalt site, linked from help and from expired buttons.
    site_url: Option<String>,
    /// Command prefixes (e.g. [".", "/"]). Mentions always work.
    command_prefixes: Option<Vec<String>>,
    button_timeout_secs: Option<u64>,
    /// Who users should ping when cobalt starts serving captchas.
    operator_contact: Option<String>,
    log_chat_id: Option<i64>,
    /// Directory for logs. Defaults to current directory.
    data_dir: Option<String>,
}

pub struct Config {
    pub telegram_bot_token: String,
    pub api_url: String,
    pub site_url: String,
    pub command_prefixes: Vec<String>,
    pub button_timeout: Duration,
    pub operator_contact: String,
    /// Chat that receives WARN/ERROR logs.
    pub log_chat_id: Option<ChatId>,
    pub data_dir: PathBuf,
}

impl Config {
    /// Build the config from an optional JSON file plus the token.
    ///
    /// `token` is the value of `TOKEN` from the environment; it is passed in
    /// so callers decide where it comes from.
    pub fn load(path: Option<&Path>, token: Option<String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::ReadFile { path: path.to_path_buf(), source: e })?;
                serde_json::from_str(&content)
                    .map_err(|e| ConfigError::ParseJson { path: path.to_path_buf(), source: e })?
            }
            None => ConfigFile::default(),
        };

        let token = token.map(|t| t.trim().to_string()).unwrap_or_default();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(format!(
                "{TOKEN_VAR} appears invalid (expected format: 123456789:ABCdefGHI...)"
            )));
        }

        let command_prefixes = file
            .command_prefixes
            .unwrap_or_else(|| vec![".".to_string(), "/".to_string()]);
        if command_prefixes.iter().any(|p| p.trim().is_empty() || p.contains(char::is_whitespace)) {
            return Err(ConfigError::Validation(
                "command_prefixes must not be empty or contain whitespace".into(),
            ));
        }

        let button_timeout = file
            .button_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        if button_timeout.is_zero() {
            return Err(ConfigError::Validation("button_timeout_secs must be positive".into()));
        }

        let api_url = file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let site_url = file.site_url.unwrap_or_else(|| "https://cobalt.tools/".to_string());
        for (name, value) in [("api_url", &api_url), ("site_url", &site_url)] {
            if reqwest::Url::parse(value).is_err() {
                return Err(ConfigError::Validation(format!("{name} is not a valid url: {value}")));
            }
        }

        Ok(Self {
            telegram_bot_token: token,
            api_url,
            site_url,
            command_prefixes,
            button_timeout,
            operator_contact: file
                .operator_contact
                .unwrap_or_else(|| "the bot operator".to_string()),
            log_chat_id: file.log_chat_id.map(ChatId),
            data_dir: file
                .data_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}
