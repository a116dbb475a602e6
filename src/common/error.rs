//! Error types for the MCP tester
//!
//! Script errors carry enough context to be printed as-is: the runner wraps
//! every handler failure in [`Error::AtLine`] so the operator sees which
//! script line aborted the run.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the MCP tester
#[derive(Error, Debug)]
pub enum Error {
    // === Script Errors ===
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Dispatch(String),

    #[error("{0}")]
    Path(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool call failed ({code}): {message}")]
    Tool {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    // === Server/Connection Errors ===
    #[error("Failed to start MCP server: {0}")]
    ServerStartFailed(String),

    #[error("MCP server closed the connection unexpectedly")]
    ServerCrashed,

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a dispatch error for a command called with the wrong arguments
    pub fn usage(command: &str, usage: &str) -> Self {
        Self::Dispatch(format!("{command} expects {usage}"))
    }

    /// Create a tool error from a JSON-RPC error object
    pub fn tool(code: i64, message: &str, data: Option<serde_json::Value>) -> Self {
        Self::Tool {
            code,
            message: message.to_string(),
            data,
        }
    }

    /// Attach a 1-based script line number
    pub fn at_line(self, line: usize) -> Self {
        match self {
            already @ Self::AtLine { .. } => already,
            other => Self::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Strip the line tag, if any
    pub fn into_inner(self) -> Self {
        match self {
            Self::AtLine { source, .. } => source.into_inner(),
            other => other,
        }
    }

    /// Stable code for logs and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "PARSE_ERROR",
            Error::Dispatch(_) => "DISPATCH_ERROR",
            Error::Path(_) => "PATH_ERROR",
            Error::ToolNotFound(_) | Error::Tool { .. } => "TOOL_ERROR",
            Error::Assertion(_) => "ASSERTION_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::AtLine { source, .. } => source.kind(),
            Error::ServerStartFailed(_) | Error::ServerCrashed => "SERVER_ERROR",
            Error::Protocol(_) | Error::Http(_) => "PROTOCOL_ERROR",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}
