use async_trait::async_trait;
use common::models::StreamMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use super::{SignalSource, TransportError};

pub const KEY_SEPARATOR: u8 = b'\t';

/// Reads `key<TAB>value` records, one per line, as printed by
/// `kafka-console-consumer --property print.key=true`.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(512),
        }
    }

    fn split_record(line: &[u8]) -> StreamMessage {
        match line.iter().position(|b| *b == KEY_SEPARATOR) {
            Some(idx) => StreamMessage::new(line[..idx].to_vec(), line[idx + 1..].to_vec()),
            None => {
                warn!("Stream record without key separator");
                StreamMessage::new(Vec::new(), line.to_vec())
            }
        }
    }
}

#[async_trait]
impl<R> SignalSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_message(&mut self) -> Result<Option<StreamMessage>, TransportError> {
        loop {
            self.buf.clear();
            let read = self.reader.read_until(b'\n', &mut self.buf).await?;
            if read == 0 {
                return Ok(None);
            }

            let mut line = self.buf.as_slice();
            while let [rest @ .., b'\n' | b'\r'] = line {
                line = rest;
            }

            if line.is_empty() {
                continue;
            }

            return Ok(Some(Self::split_record(line)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_keyed_records_in_order() {
        let input: &[u8] = b"XYZ\t{\"signal\":\"buy\"}\nABC\t{\"signal\":\"sell\"}\r\n";
        let mut source = LineSource::new(input);

        let first = source.next_message().await.unwrap().unwrap();
        assert_eq!(first.key, b"XYZ");
        assert_eq!(first.value, b"{\"signal\":\"buy\"}");

        let second = source.next_message().await.unwrap().unwrap();
        assert_eq!(second.key, b"ABC");
        assert_eq!(second.value, b"{\"signal\":\"sell\"}");

        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skips_blank_lines() {
        let input: &[u8] = b"\n\r\nXYZ\tpayload";
        let mut source = LineSource::new(input);

        let message = source.next_message().await.unwrap().unwrap();
        assert_eq!(message.key, b"XYZ");
        assert_eq!(message.value, b"payload");
        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_without_separator_has_empty_key() {
        let input: &[u8] = b"{\"signal\":\"buy\"}\n";
        let mut source = LineSource::new(input);

        let message = source.next_message().await.unwrap().unwrap();
        assert!(message.key.is_empty());
        assert_eq!(message.value, b"{\"signal\":\"buy\"}");
    }

    #[tokio::test]
    async fn test_value_may_contain_tabs() {
        let input: &[u8] = b"XYZ\ta\tb\n";
        let mut source = LineSource::new(input);

        let message = source.next_message().await.unwrap().unwrap();
        assert_eq!(message.key, b"XYZ");
        assert_eq!(message.value, b"a\tb");
    }
}
