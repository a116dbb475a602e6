//! MCP message types
//!
//! JSON-RPC 2.0 envelopes plus the handful of MCP payloads the tester reads.
//! Tool call results are deliberately kept as `serde_json::Value`: servers in
//! the wild omit or misname fields, and the script runner only needs
//! path-addressable data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Client name reported to servers
pub const CLIENT_NAME: &str = "mcp-tester";

// ============================================================================
// JSON-RPC envelopes
// ============================================================================

/// Outgoing request
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: i64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// Outgoing notification (no id, no response)
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Incoming response
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// Any message read from the server
#[derive(Debug, Clone)]
pub enum Incoming {
    /// Reply to one of our requests
    Response(Response),
    /// Server-initiated notification
    Notification { method: String, params: Value },
    /// Server-initiated request (sampling, roots, ping)
    Request {
        id: Value,
        method: String,
        params: Value,
    },
}

impl Incoming {
    /// Classify a raw JSON-RPC message
    pub fn classify(msg: Value) -> Result<Self, serde_json::Error> {
        let has_method = msg.get("method").and_then(Value::as_str).is_some();
        let has_id = msg.get("id").map(|id| !id.is_null()).unwrap_or(false);

        if has_method {
            let method = msg["method"].as_str().unwrap_or_default().to_string();
            let params = msg.get("params").cloned().unwrap_or(Value::Null);
            if has_id {
                Ok(Incoming::Request {
                    id: msg["id"].clone(),
                    method,
                    params,
                })
            } else {
                Ok(Incoming::Notification { method, params })
            }
        } else {
            serde_json::from_value(msg).map(Incoming::Response)
        }
    }
}

// ============================================================================
// Initialize
// ============================================================================

/// Server identity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Implementation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Result of the `initialize` handshake
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: Implementation,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Capabilities advertised by the server; presence is what matters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCapabilities {
    pub logging: Option<Value>,
    pub prompts: Option<Value>,
    pub resources: Option<Value>,
    pub tools: Option<Value>,
}

impl ServerCapabilities {
    /// Names of the advertised capability groups
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.logging.is_some() {
            names.push("Logging");
        }
        if self.resources.is_some() {
            names.push("Resources");
        }
        if self.prompts.is_some() {
            names.push("Prompts");
        }
        if self.tools.is_some() {
            names.push("Tools");
        }
        names
    }
}

// ============================================================================
// Tools
// ============================================================================

/// A tool as advertised by `tools/list`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl ToolDescriptor {
    /// Declared input properties, if the schema has any
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.input_schema
            .as_ref()?
            .get("properties")?
            .as_object()
    }

    /// Declared JSON type of one input property
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties()?.get(name)?.get("type")?.as_str()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// ============================================================================
// Prompts and resources
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPromptsResult {
    #[serde(default)]
    pub prompts: Vec<PromptDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResult {
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// ============================================================================
// Content fragments
// ============================================================================

/// Concatenate the `text` of every fragment in a result's `content` sequence
pub fn flatten_text(result: &Value) -> String {
    content_fragments(result)
        .filter_map(|fragment| fragment.get("text").and_then(Value::as_str))
        .collect()
}

/// The entries of a result's `content` sequence (empty if absent)
pub fn content_fragments(result: &Value) -> impl Iterator<Item = &Value> {
    result
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// One-line human description of a content fragment
pub fn describe_fragment(fragment: &Value) -> String {
    let kind = fragment.get("type").and_then(Value::as_str).unwrap_or("");
    let data_len = fragment
        .get("data")
        .and_then(Value::as_str)
        .map(str::len)
        .unwrap_or(0);
    let mime = fragment
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    match kind {
        "image" => format!("[Image {}, {} bytes]", mime, data_len),
        "audio" => format!("[Audio {}, {} bytes]", mime, data_len),
        "resource" | "resource_link" => {
            let uri = fragment
                .get("uri")
                .or_else(|| fragment.get("resource").and_then(|r| r.get("uri")))
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("[Resource {}]", uri)
        }
        _ => match fragment.get("text").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => fragment.to_string(),
        },
    }
}

/// Whether the result is flagged as a tool-level failure
pub fn is_error_result(result: &Value) -> bool {
    result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
