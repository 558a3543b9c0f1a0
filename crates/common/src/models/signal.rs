use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::StreamMessage;

/// Layout of the `at` field, e.g. `2024-03-01 14:30:00 +0100`.
pub const SIGNAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Buy,
    Sell,
    Unknown,
}

impl Intent {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "buy" => Self::Buy,
            "sell" => Self::Sell,
            _ => Self::Unknown,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("message key is not valid UTF-8: {0}")]
    InvalidKey(#[from] std::str::Utf8Error),
    #[error("message key is empty")]
    EmptySymbol,
    #[error("message key {0:?} is not a ticker symbol")]
    InvalidSymbol(String),
    #[error("message value is not a signal payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("unparsable signal timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}

/// Wire payload carried in the message value.
#[derive(Debug, Deserialize)]
struct SignalPayload {
    signal: String,
    at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub symbol: String,
    pub intent: Intent,
    pub signaled_at: DateTime<FixedOffset>,
}

impl Signal {
    pub fn parse(message: &StreamMessage) -> Result<Self, ParseError> {
        let symbol = std::str::from_utf8(&message.key)?.trim();
        if symbol.is_empty() {
            return Err(ParseError::EmptySymbol);
        }
        if !is_ticker(symbol) {
            return Err(ParseError::InvalidSymbol(symbol.to_string()));
        }

        let payload: SignalPayload = serde_json::from_slice(&message.value)?;
        let signaled_at = DateTime::parse_from_str(payload.at.trim(), SIGNAL_TIME_FORMAT)
            .map_err(|source| ParseError::Timestamp {
                value: payload.at.clone(),
                source,
            })?;

        Ok(Self {
            symbol: symbol.to_string(),
            intent: Intent::parse(&payload.signal),
            signaled_at,
        })
    }

    /// A signal is live only while strictly newer than `now - 24h`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::hours(FRESHNESS_WINDOW_HOURS);
        self.signaled_at.with_timezone(&Utc) > cutoff
    }
}

/// Letters, digits and inner dots (`BRK.B`). The symbol ends up in request paths.
fn is_ticker(symbol: &str) -> bool {
    symbol.starts_with(|c: char| c.is_ascii_alphanumeric())
        && symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}
