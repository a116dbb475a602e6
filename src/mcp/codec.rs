//! MCP stdio wire codec
//!
//! The stdio transport frames each JSON-RPC message as a single line:
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"tools/list"}\n
//! ```
//! Messages must not contain embedded newlines.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Error;

/// Sanity cap for a single message line
const MAX_LINE_BYTES: usize = 100 * 1024 * 1024;

/// Read one message line from the stream
///
/// Blank lines are skipped. End of stream means the server went away.
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, Error> {
    read_line_limited(reader, MAX_LINE_BYTES).await
}

/// Read one non-blank line of at most `limit` bytes, newline included
///
/// At most `limit + 1` bytes are buffered before an oversized line is
/// rejected.
async fn read_line_limited<R: AsyncBufRead + Unpin>(reader: &mut R, limit: usize) -> Result<String, Error> {
    loop {
        let mut buf = Vec::new();
        let bytes_read = (&mut *reader)
            .take(limit as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    Error::ServerCrashed
                } else {
                    Error::Io(e)
                }
            })?;

        if bytes_read == 0 {
            return Err(Error::ServerCrashed);
        }

        if buf.len() > limit {
            return Err(Error::Protocol(format!(
                "Message too large: more than {} bytes",
                limit
            )));
        }

        let line = String::from_utf8(buf)
            .map_err(|e| Error::Protocol(format!("Message is not valid UTF-8: {}", e)))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}

/// Write one message line to the stream
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<(), Error> {
    if json.contains('\n') {
        return Err(Error::Protocol(
            "Message contains an embedded newline".to_string(),
        ));
    }

    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_read_message() {
        let data = b"{\"test\":true}\n";
        let mut reader = BufReader::new(Cursor::new(data.to_vec()));

        let result = read_message(&mut reader).await.unwrap();
        assert_eq!(result, "{\"test\":true}");
    }

    #[tokio::test]
    async fn test_read_message_skips_blank_lines() {
        let data = b"\r\n\n{\"a\":1}\r\n{\"b\":2}\n";
        let mut reader = BufReader::new(Cursor::new(data.to_vec()));

        assert_eq!(read_message(&mut reader).await.unwrap(), "{\"a\":1}");
        assert_eq!(read_message(&mut reader).await.unwrap(), "{\"b\":2}");
        assert!(matches!(
            read_message(&mut reader).await,
            Err(Error::ServerCrashed)
        ));
    }

    #[tokio::test]
    async fn test_oversized_line_is_rejected() {
        let data = b"{\"a\":1}\n{\"long\":123456}\n".to_vec();
        let mut reader = BufReader::new(Cursor::new(data));

        assert_eq!(read_line_limited(&mut reader, 8).await.unwrap(), "{\"a\":1}");
        let err = read_line_limited(&mut reader, 8).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ref msg) if msg.contains("too large")), "{}", err);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_protocol_error() {
        let mut reader = BufReader::new(Cursor::new(vec![0xff, 0xfe, b'\n']));
        assert!(matches!(
            read_message(&mut reader).await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_write_message() {
        let mut output = Vec::new();
        write_message(&mut output, "{\"test\":true}").await.unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "{\"test\":true}\n");
    }

    #[tokio::test]
    async fn test_write_rejects_embedded_newline() {
        let mut output = Vec::new();
        let err = write_message(&mut output, "{\n}").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(output.is_empty());
    }
}
