use governor::Quota;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;
use url::Url;

use duelbot_client::RetryPolicy;
use duelbot_types::game::{DEFAULT_DUEL_KEYWORD, DEFAULT_ROULETTE_KEYWORD};

pub mod assistant;
pub mod completer;
pub mod dispatcher;
pub mod engine;
pub mod router;
pub mod transport;

/// Environment variable holding the chat transport token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the completion API key.
pub const COMPLETION_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for the [engine::Engine].
///
/// Every field has a default, so an empty document (or no file at all) is a
/// valid configuration. Secrets are never read from the file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Attempts per read (update polls, identity lookup); sends are never retried.
    #[serde(default = "default_poll_retry_attempts")]
    pub poll_retry_attempts: usize,

    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    #[serde(default = "default_completion_api_url")]
    pub completion_api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_request_interval_secs")]
    pub request_interval_secs: u64,
    #[serde(default = "default_daily_token_limit")]
    pub daily_token_limit: u64,

    #[serde(default = "default_duel_keyword")]
    pub duel_keyword: String,
    #[serde(default = "default_roulette_keyword")]
    pub roulette_keyword: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    MissingEnv { name: &'static str },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{field} is not a valid url: {value}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

pub struct ValidatedConfig {
    pub telegram_token: String,
    pub completion_key: String,

    pub log_level: Level,
    pub log_json: bool,

    pub mailbox_size: usize,
    pub poll_timeout: Duration,
    pub retry_policy: RetryPolicy,

    pub telegram_api_url: Url,
    pub completion_api_url: Url,
    pub model: String,
    pub max_tokens: u32,

    pub request_quota: Quota,
    pub daily_token_limit: u64,

    pub duel_keyword: String,
    pub roulette_keyword: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mailbox_size() -> usize {
    1_024
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_poll_retry_attempts() -> usize {
    3
}

fn default_telegram_api_url() -> String {
    duelbot_client::telegram::DEFAULT_API_URL.to_string()
}

fn default_completion_api_url() -> String {
    duelbot_client::completions::DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    duelbot_client::completions::DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    duelbot_client::completions::DEFAULT_MAX_TOKENS
}

fn default_request_interval_secs() -> u64 {
    60
}

fn default_daily_token_limit() -> u64 {
    100_000
}

fn default_duel_keyword() -> String {
    DEFAULT_DUEL_KEYWORD.to_string()
}

fn default_roulette_keyword() -> String {
    DEFAULT_ROULETTE_KEYWORD.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            mailbox_size: default_mailbox_size(),
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_retry_attempts: default_poll_retry_attempts(),
            telegram_api_url: default_telegram_api_url(),
            completion_api_url: default_completion_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            request_interval_secs: default_request_interval_secs(),
            daily_token_limit: default_daily_token_limit(),
            duel_keyword: default_duel_keyword(),
            roulette_keyword: default_roulette_keyword(),
        }
    }
}

fn require_env(
    env: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    env(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingEnv { name })
}

fn require_non_zero(field: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(value)
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}

fn parse_keyword(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let keyword = value.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(ConfigError::Empty { field });
    }
    Ok(keyword)
}

impl Config {
    /// Check the configuration and pull secrets through `env`.
    ///
    /// `env` is usually `|name| std::env::var(name).ok()`.
    pub fn validate(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ValidatedConfig, ConfigError> {
        let telegram_token = require_env(&env, TELEGRAM_TOKEN_ENV)?;
        let completion_key = require_env(&env, COMPLETION_KEY_ENV)?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        require_non_zero("mailbox_size", self.mailbox_size as u64)?;
        require_non_zero("poll_retry_attempts", self.poll_retry_attempts as u64)?;
        require_non_zero("max_tokens", u64::from(self.max_tokens))?;
        require_non_zero("daily_token_limit", self.daily_token_limit)?;
        let interval = require_non_zero("request_interval_secs", self.request_interval_secs)?;
        let request_quota = Quota::with_period(Duration::from_secs(interval)).ok_or(
            ConfigError::InvalidNonZero {
                field: "request_interval_secs",
                value: interval,
            },
        )?;

        let telegram_api_url = parse_url("telegram_api_url", &self.telegram_api_url)?;
        let completion_api_url = parse_url("completion_api_url", &self.completion_api_url)?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::Empty { field: "model" });
        }

        let duel_keyword = parse_keyword("duel_keyword", &self.duel_keyword)?;
        let roulette_keyword = parse_keyword("roulette_keyword", &self.roulette_keyword)?;

        Ok(ValidatedConfig {
            telegram_token,
            completion_key,
            log_level,
            log_json: self.log_json,
            mailbox_size: self.mailbox_size,
            poll_timeout: Duration::from_secs(self.poll_timeout_secs),
            retry_policy: RetryPolicy {
                max_attempts: self.poll_retry_attempts,
                ..RetryPolicy::default()
            },
            telegram_api_url,
            completion_api_url,
            model: self.model,
            max_tokens: self.max_tokens,
            request_quota,
            daily_token_limit: self.daily_token_limit,
            duel_keyword,
            roulette_keyword,
        })
    }
}
