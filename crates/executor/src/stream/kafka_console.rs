use std::process::Stdio;

use async_trait::async_trait;
use common::config::BotConfig;
use common::models::StreamMessage;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{info, warn};

use super::{LineSource, SignalSource, TransportError};

/// Runs the Kafka console consumer as a child process and reads its output.
/// The process is started on the first read and killed when the source is dropped.
pub struct KafkaConsoleSource {
    program: String,
    args: Vec<String>,
    running: Option<(Child, LineSource<BufReader<ChildStdout>>)>,
}

impl KafkaConsoleSource {
    pub fn new(config: &BotConfig) -> Self {
        Self::with_command(config.console_consumer.clone(), Self::consumer_args(config))
    }

    pub fn with_command(program: String, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            running: None,
        }
    }

    pub fn consumer_args(config: &BotConfig) -> Vec<String> {
        vec![
            "--bootstrap-server".to_string(),
            config.kafka_endpoint.clone(),
            "--topic".to_string(),
            config.kafka_topic.clone(),
            "--partition".to_string(),
            config.kafka_partition.to_string(),
            "--offset".to_string(),
            "latest".to_string(),
            "--property".to_string(),
            "print.key=true".to_string(),
            "--property".to_string(),
            "key.separator=\t".to_string(),
        ]
    }

    fn spawn(&self) -> Result<(Child, LineSource<BufReader<ChildStdout>>), TransportError> {
        let spawn_error = |source: std::io::Error| TransportError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            spawn_error(std::io::Error::other("consumer stdout was not captured"))
        })?;

        info!("Started stream consumer: {} {}", self.program, self.args.join(" "));
        Ok((child, LineSource::new(BufReader::new(stdout))))
    }
}

#[async_trait]
impl SignalSource for KafkaConsoleSource {
    async fn next_message(&mut self) -> Result<Option<StreamMessage>, TransportError> {
        if self.running.is_none() {
            self.running = Some(self.spawn()?);
        }

        let Some((child, lines)) = self.running.as_mut() else {
            return Ok(None);
        };

        match lines.next_message().await? {
            Some(message) => Ok(Some(message)),
            None => {
                match child.wait().await {
                    Ok(status) if status.success() => info!("Stream consumer exited"),
                    Ok(status) => warn!("Stream consumer exited with {}", status),
                    Err(e) => warn!("Failed to reap stream consumer: {}", e),
                }
                self.running = None;
                Ok(None)
            }
        }
    }
}
