use thiserror::Error;

/// Failures of the read-only brokerage calls.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: &'static str },

    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered with unexpected status {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("malformed {endpoint} response: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },

    #[error("no {what} found for {key:?}")]
    NotFound { what: &'static str, key: String },

    #[error("no tradable quote for {symbol}")]
    NoTradableQuote { symbol: String },
}

impl GatewayError {
    pub fn from_reqwest(endpoint: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Transport { endpoint, source }
        }
    }

    pub fn malformed(endpoint: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            endpoint,
            reason: reason.to_string(),
        }
    }

    /// True for failures that never reached a brokerage answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }
}

/// Failures of the single order POST. Never retried.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("order request timed out")]
    Timeout,

    #[error("order request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("order answered with unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for SubmissionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}
