use async_trait::async_trait;
use common::models::StreamMessage;
use thiserror::Error;

pub mod kafka_console;
pub mod line_source;

pub use kafka_console::KafkaConsoleSource;
pub use line_source::LineSource;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to start stream consumer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read from stream: {0}")]
    Read(#[from] std::io::Error),
}

impl TransportError {
    /// The stream could never be opened; restarting will not help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// Hands out stream messages one at a time. `Ok(None)` means the stream closed.
#[async_trait]
pub trait SignalSource: Send {
    async fn next_message(&mut self) -> Result<Option<StreamMessage>, TransportError>;
}
