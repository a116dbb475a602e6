//! MCP client for talking to a tool server
//!
//! Handles the initialize handshake, request/response correlation, and the
//! server notifications (logs, progress) that arrive while a request is in
//! flight.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::common::config::{Target, Timeouts};
use crate::common::{Error, Result};
use crate::scripting::ToolInvoker;

use super::transport::{HttpTransport, StdioTransport, Transport};
use super::types::*;

/// MCP client over any transport
pub struct McpClient {
    transport: Box<dyn Transport>,
    /// Id for the next request
    next_id: i64,
    /// Handshake result (server identity and capabilities)
    pub server: InitializeResult,
    request_timeout: Duration,
}

impl McpClient {
    /// Connect to a resolved target and run the initialize handshake
    pub async fn connect(target: &Target, timeouts: &Timeouts) -> Result<Self> {
        let transport: Box<dyn Transport> = match target {
            Target::Command(command) => Box::new(StdioTransport::spawn(command)?),
            Target::Url(url) => Box::new(HttpTransport::new(url)?),
        };
        Self::with_transport(transport, timeouts).await
    }

    /// Run the initialize handshake over an already-open transport
    pub async fn with_transport(transport: Box<dyn Transport>, timeouts: &Timeouts) -> Result<Self> {
        let mut client = Self {
            transport,
            next_id: 1,
            server: InitializeResult::default(),
            request_timeout: Duration::from_secs(timeouts.initialize_secs),
        };

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        });

        client.server = client.request("initialize", Some(params)).await?;
        client
            .notify("notifications/initialized", None)
            .await?;
        client.request_timeout = Duration::from_secs(timeouts.request_secs);

        tracing::info!(
            "Connected to {} {} (protocol {})",
            client.server.server_info.name,
            client.server.server_info.version,
            client.server.protocol_version
        );

        Ok(client)
    }

    /// Get the next request id
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Send a notification (no response expected)
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = Notification::new(method, params);
        self.transport
            .send(&serde_json::to_value(&notification)?)
            .await
    }

    /// Send a request and wait for the response
    ///
    /// Notifications that arrive while waiting are logged. Responses to
    /// earlier requests (abandoned by a timeout) are discarded.
    pub async fn request<T: serde::de::DeserializeOwned>(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let limit = self.request_timeout;
        match tokio::time::timeout(limit, self.request_value(method, params)).await {
            Ok(result) => {
                let value = result?;
                serde_json::from_value(value).map_err(|e| {
                    Error::Protocol(format!("Failed to parse {} response: {}", method, e))
                })
            }
            Err(_) => Err(Error::Timeout(limit.as_millis() as u64)),
        }
    }

    async fn request_value(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id();
        let request = Request::new(id, method, params);
        self.transport.send(&serde_json::to_value(&request)?).await?;

        loop {
            let msg = self.transport.receive().await?;
            match Incoming::classify(msg)? {
                Incoming::Response(response) => {
                    if response.id.as_i64() != Some(id) {
                        tracing::debug!("Discarding stale response for id {}", response.id);
                        continue;
                    }
                    if let Some(err) = response.error {
                        return Err(Error::tool(err.code, &err.message, err.data));
                    }
                    return Ok(response.result.unwrap_or(Value::Null));
                }
                Incoming::Notification { method, params } => {
                    log_notification(&method, &params);
                }
                Incoming::Request { id, method, .. } => {
                    self.answer_server_request(id, &method).await?;
                }
            }
        }
    }

    /// Reply to a server-initiated request; only `ping` is supported
    async fn answer_server_request(&mut self, id: Value, method: &str) -> Result<()> {
        let reply = if method == "ping" {
            json!({"jsonrpc": "2.0", "id": id, "result": {}})
        } else {
            tracing::warn!("Server requested unsupported method '{}'", method);
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("Method not found: {}", method)}
            })
        };
        self.transport.send(&reply).await
    }

    /// List every tool, following pagination cursors
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ListToolsResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }
    }

    /// Call a tool and return the raw, loosely-typed result
    pub async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        let params = json!({
            "name": name,
            "arguments": arguments,
            "_meta": { "progressToken": format!("script-progress-{}", name) }
        });
        self.request("tools/call", Some(params)).await
    }

    /// List prompts
    pub async fn list_prompts(&mut self) -> Result<Vec<PromptDescriptor>> {
        let mut prompts = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ListPromptsResult = self.request("prompts/list", params).await?;
            prompts.extend(page.prompts);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(prompts),
            }
        }
    }

    /// Render a prompt with string arguments
    pub async fn get_prompt(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        self.request(
            "prompts/get",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    /// List resources
    pub async fn list_resources(&mut self) -> Result<Vec<ResourceDescriptor>> {
        let mut resources = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ListResourcesResult = self.request("resources/list", params).await?;
            resources.extend(page.resources);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(resources),
            }
        }
    }

    /// Read one resource
    pub async fn read_resource(&mut self, uri: &str) -> Result<Value> {
        self.request("resources/read", Some(json!({ "uri": uri })))
            .await
    }

    /// Ask the server to raise its log verbosity
    pub async fn set_logging_level(&mut self, level: &str) -> Result<()> {
        self.request::<Value>("logging/setLevel", Some(json!({ "level": level })))
            .await?;
        Ok(())
    }

    /// Shut down the connection
    pub async fn close(mut self) -> Result<()> {
        self.transport.close().await
    }
}

#[async_trait]
impl ToolInvoker for McpClient {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        McpClient::list_tools(self).await
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        McpClient::call_tool(self, name, arguments).await
    }
}

/// Log a server notification at a level matching its content
fn log_notification(method: &str, params: &Value) {
    match method {
        "notifications/message" => {
            let level = params.get("level").and_then(Value::as_str).unwrap_or("info");
            let logger = params.get("logger").and_then(Value::as_str).unwrap_or("server");
            let data = match params.get("data") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            match level {
                "debug" => tracing::debug!("[SERVER LOG] {}: {}", logger, data),
                "info" | "notice" => tracing::info!("[SERVER LOG] {}: {}", logger, data),
                "warning" => tracing::warn!("[SERVER LOG] {}: {}", logger, data),
                _ => tracing::error!("[SERVER LOG] [{}] {}: {}", level, logger, data),
            }
        }
        "notifications/progress" => {
            let progress = params.get("progress").and_then(Value::as_f64).unwrap_or(0.0);
            let total = params.get("total").and_then(Value::as_f64);
            let message = params.get("message").and_then(Value::as_str).unwrap_or("");
            match total {
                Some(total) => tracing::info!("[PROGRESS] {:.2}/{:.2} {}", progress, total, message),
                None => tracing::info!("[PROGRESS] {:.2} {}", progress, message),
            }
        }
        other => tracing::debug!("Ignoring notification {}", other),
    }
}
