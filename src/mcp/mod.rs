//! Model Context Protocol (MCP) client
//!
//! This module implements the client side of MCP: JSON-RPC framing, the
//! stdio and HTTP transports, and the handful of requests the tester needs.

pub mod client;
pub mod codec;
pub mod transport;
pub mod types;

pub use client::McpClient;
pub use types::*;
