//! MCP transport layer
//!
//! Abstracts the two ways of reaching a server: a child process speaking
//! newline-delimited JSON over stdio, and an HTTP endpoint that answers each
//! POSTed message with JSON or a short server-sent event stream.

use std::collections::VecDeque;
use std::process::Stdio;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tokio::io::{BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::common::{Error, Result};

use super::codec;

/// Header carrying the HTTP session id
const SESSION_HEADER: &str = "mcp-session-id";

/// A bidirectional JSON-RPC message channel
#[async_trait]
pub trait Transport: Send {
    /// Send one message
    async fn send(&mut self, message: &Value) -> Result<()>;

    /// Receive the next message
    async fn receive(&mut self) -> Result<Value>;

    /// Release the underlying connection or process
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// stdio
// ============================================================================

/// Server launched as a child process
pub struct StdioTransport {
    /// Server subprocess
    child: Child,
    /// Buffered reader for server stdout
    reader: BufReader<ChildStdout>,
    /// Buffered writer for server stdin
    writer: BufWriter<ChildStdin>,
}

impl StdioTransport {
    /// Spawn `sh -c <command>` and attach to its stdio
    pub fn spawn(command: &str) -> Result<Self> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Let server diagnostics go to stderr
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::ServerStartFailed(format!("Failed to start '{}': {}", command, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::ServerStartFailed("Failed to get server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ServerStartFailed("Failed to get server stdout".to_string()))?;

        tracing::debug!("Spawned MCP server: {}", command);

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            writer: BufWriter::new(stdin),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: &Value) -> Result<()> {
        let json = serde_json::to_string(message)?;
        tracing::debug!("MCP >>> {}", json);
        codec::write_message(&mut self.writer, &json).await
    }

    async fn receive(&mut self) -> Result<Value> {
        let json = codec::read_message(&mut self.reader).await?;
        tracing::debug!("MCP <<< {}", json);
        serde_json::from_str(&json).map_err(|e| Error::Protocol(format!("Invalid JSON: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        // Closing stdin is the polite shutdown signal for stdio servers
        let _ = tokio::io::AsyncWriteExt::shutdown(&mut self.writer).await;

        match tokio::time::timeout(std::time::Duration::from_millis(500), self.child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                let _ = self.child.kill().await;
            }
        }
        Ok(())
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Server reached over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    session_id: Option<String>,
    /// Messages received in response bodies, waiting to be read
    inbox: VecDeque<Value>,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mcp-tester/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            session_id: None,
            inbox: VecDeque::new(),
        })
    }

    fn enqueue(&mut self, value: Value) {
        match value {
            Value::Array(batch) => self.inbox.extend(batch),
            other => self.inbox.push_back(other),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&mut self, message: &Value) -> Result<()> {
        tracing::debug!("MCP >>> {}", message);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(message);
        if let Some(session) = &self.session_id {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(session.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Protocol(format!("HTTP {}: {}", status, body.trim())));
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .map(|ct| ct.starts_with("text/event-stream"))
            .unwrap_or(false);

        if is_event_stream {
            let mut parser = SseParser::default();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                for data in parser.push(&String::from_utf8_lossy(&chunk)) {
                    self.enqueue(parse_body(&data)?);
                }
            }
            if let Some(data) = parser.finish() {
                self.enqueue(parse_body(&data)?);
            }
        } else {
            let body = response.text().await?;
            if !body.trim().is_empty() {
                self.enqueue(parse_body(&body)?);
            }
        }

        Ok(())
    }

    async fn receive(&mut self) -> Result<Value> {
        let message = self.inbox.pop_front().ok_or_else(|| {
            Error::Protocol("HTTP server sent no response for the pending request".to_string())
        })?;
        tracing::debug!("MCP <<< {}", message);
        Ok(message)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session_id.take() {
            let _ = self
                .client
                .delete(&self.endpoint)
                .header(SESSION_HEADER, session)
                .send()
                .await;
        }
        Ok(())
    }
}

fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::Protocol(format!("Invalid JSON: {}", e)))
}

/// Incremental parser for `text/event-stream` bodies
///
/// Only `data:` fields matter; events are separated by a blank line and
/// multi-line data is joined with `\n`.
#[derive(Default)]
struct SseParser {
    pending: String,
    data: Vec<String>,
}

impl SseParser {
    /// Feed a chunk, returning the data of every completed event
    fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.trim_start().to_string());
            }
        }

        events
    }

    /// Flush an event left open at end of stream
    fn finish(&mut self) -> Option<String> {
        let leftover = std::mem::take(&mut self.pending);
        if let Some(value) = leftover.trim_end().strip_prefix("data:") {
            self.data.push(value.trim_start().to_string());
        }
        if self.data.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data).join("\n"))
        }
    }
}
