//! mcp-tester - scripted testing for Model Context Protocol servers
//!
//! This library provides the script interpreter, the MCP client it drives,
//! and the CLI plumbing around them.

pub mod cli;
pub mod commands;
pub mod common;
pub mod mcp;
pub mod scripting;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use scripting::{Command, Runner};
