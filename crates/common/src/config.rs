use std::{env, fmt, time::Duration};

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.robinhood.com";
pub const DEFAULT_CONSOLE_CONSUMER: &str = "kafka-console-consumer";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub robinhood_token: String,
    /// API root without a trailing slash.
    pub base_url: String,
    pub kafka_endpoint: String,
    pub kafka_topic: String,
    pub kafka_partition: u32,
    pub console_consumer: String,
    pub request_timeout: Duration,
    pub dry_run: bool,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let robinhood_token = required("ROBINHOOD_TOKEN")?;
        let base_url = parse_base_url(
            optional("ROBINHOOD_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let kafka_endpoint = required("KAFKA_ENDPOINT")?;
        let kafka_topic = required("KAFKA_TOPIC")?;
        let raw_partition = required("KAFKA_PARTITION")?;
        let kafka_partition = raw_partition
            .parse::<u32>()
            .map_err(|e| ConfigError::Invalid {
                key: "KAFKA_PARTITION",
                value: raw_partition.clone(),
                reason: e.to_string(),
            })?;
        let console_consumer = optional("KAFKA_CONSOLE_CONSUMER")
            .unwrap_or_else(|| DEFAULT_CONSOLE_CONSUMER.to_string());

        let request_timeout = match optional("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "REQUEST_TIMEOUT_SECS",
                        value: raw,
                        reason: "timeout must be positive".to_string(),
                    });
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "REQUEST_TIMEOUT_SECS",
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let dry_run = match optional("DRY_RUN") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "DRY_RUN",
                value: raw.clone(),
                reason: "expected true/false".to_string(),
            })?,
            None => false,
        };

        Ok(Self {
            robinhood_token,
            base_url,
            kafka_endpoint,
            kafka_topic,
            kafka_partition,
            console_consumer,
            request_timeout,
            dry_run,
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("robinhood_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("kafka_endpoint", &self.kafka_endpoint)
            .field("kafka_topic", &self.kafka_topic)
            .field("kafka_partition", &self.kafka_partition)
            .field("console_consumer", &self.console_consumer)
            .field("request_timeout", &self.request_timeout)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

fn parse_base_url(raw: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        key: "ROBINHOOD_BASE_URL",
        value: raw.clone(),
        reason: e.to_string(),
    })?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(ConfigError::Invalid {
            key: "ROBINHOOD_BASE_URL",
            value: raw,
            reason: "scheme must be http or https".to_string(),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
