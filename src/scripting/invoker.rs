//! Collaborators the script runner suspends on
//!
//! The runner never talks to a transport directly: it resolves and calls
//! tools through [`ToolInvoker`] and reads operator input through
//! [`InputSource`], so tests can substitute both.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use crate::common::Result;
use crate::mcp::ToolDescriptor;

/// Tool discovery and invocation
#[async_trait]
pub trait ToolInvoker: Send {
    /// Every tool the server advertises
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke a tool, returning the raw result
    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value>;
}

#[async_trait]
impl<T: ToolInvoker + ?Sized> ToolInvoker for &mut T {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        (**self).list_tools().await
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        (**self).call_tool(name, arguments).await
    }
}

/// Line-based interactive input
#[async_trait]
pub trait InputSource: Send {
    /// Show `prompt` and read one line; `None` at end of input
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads operator input from the process stdin
pub struct StdinInput {
    reader: BufReader<Stdin>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}

/// Remove a trailing `\n` or `\r\n` and nothing else
pub(crate) fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending_keeps_inner_whitespace() {
        assert_eq!(strip_line_ending("  hello world \r\n".to_string()), "  hello world ");
        assert_eq!(strip_line_ending("value\n".to_string()), "value");
        assert_eq!(strip_line_ending("no newline".to_string()), "no newline");
    }
}
