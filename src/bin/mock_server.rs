//! Mock MCP server binary for integration testing
//!
//! This binary implements a minimal Model Context Protocol server over
//! stdio (newline-delimited JSON-RPC) that can be used for testing without
//! a real tool server.

use base64::Engine;
use serde_json::{json, Map, Value};
use std::io::{BufRead, BufReader, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const PROTOCOL_VERSION: &str = "2025-06-18";

fn main() {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    let mut state = MockState::default();

    for line in reader.lines() {
        let Ok(line) = line else {
            break; // EOF or broken pipe
        };
        if line.trim().is_empty() {
            continue;
        }

        let message: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        for outgoing in state.process_message(&message) {
            send_message(&mut writer, &outgoing);
        }
    }
}

fn send_message<W: Write>(writer: &mut W, message: &Value) {
    writeln!(writer, "{}", message).ok();
    writer.flush().ok();
}

#[derive(Default)]
struct MockState {
    log_level: Option<String>,
}

impl MockState {
    /// Handle one incoming message, returning everything to write back
    fn process_message(&mut self, message: &Value) -> Vec<Value> {
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            return Vec::new(); // responses to our (nonexistent) requests
        };
        let Some(id) = message.get("id").cloned() else {
            return Vec::new(); // notifications need no answer
        };
        let params = message.get("params").cloned().unwrap_or(json!({}));

        let mut outgoing = Vec::new();
        let result = match method {
            "initialize" => Ok(json!({
                "protocolVersion": params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(PROTOCOL_VERSION),
                "capabilities": {
                    "logging": {},
                    "prompts": {},
                    "resources": {},
                    "tools": {}
                },
                "serverInfo": {
                    "name": "mock-mcp-server",
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "logging/setLevel" => {
                self.log_level = params
                    .get("level")
                    .and_then(Value::as_str)
                    .map(String::from);
                Ok(json!({}))
            }
            "tools/list" => Ok(json!({ "tools": tool_list() })),
            "tools/call" => self.call_tool(&params, &mut outgoing),
            "prompts/list" => Ok(json!({
                "prompts": [{
                    "name": "persona_developer",
                    "description": "Sets the model persona to an expert Rust developer",
                    "arguments": [{
                        "name": "expertise",
                        "description": "Specific field like 'backend' or 'cli'",
                        "required": false
                    }]
                }]
            })),
            "prompts/get" => get_prompt(&params),
            "resources/list" => Ok(json!({
                "resources": [{
                    "uri": "mcp://time",
                    "name": "System Clock",
                    "description": "The current server time",
                    "mimeType": "text/plain"
                }]
            })),
            "resources/read" => read_resource(&params),
            _ => Err((-32601, format!("Method not found: {}", method))),
        };

        outgoing.push(match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message }
            }),
        });
        outgoing
    }

    fn call_tool(&self, params: &Value, outgoing: &mut Vec<Value>) -> Result<Value, (i64, String)> {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let args = params
            .get("arguments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match name {
            "echo" => {
                let message = string_arg(&args, "message");
                Ok(json!({
                    "content": [{ "type": "text", "text": format!("Echo: {}", message) }],
                    "structuredContent": { "echo": message },
                    "isError": false
                }))
            }
            "add" => {
                let (Some(a), Some(b)) = (int_arg(&args, "a"), int_arg(&args, "b")) else {
                    return Err((-32602, "add expects integer arguments a and b".to_string()));
                };
                Ok(json!({
                    "content": [{ "type": "text", "text": format!("Result: {}", a + b) }],
                    "structuredContent": { "sum": a + b, "a": a, "b": b },
                    "isError": false
                }))
            }
            "describe" => Ok(json!({
                "content": [{ "type": "text", "text": "Mock server description" }],
                "structuredContent": {
                    "name": "mock-mcp-server",
                    "ratio": 0.5,
                    "nothing": null,
                    "nested": {
                        "key": "value",
                        "list": ["a", "b", "c"]
                    }
                },
                "isError": false
            })),
            "fail" => Ok(json!({
                "content": [{ "type": "text", "text": "intentional failure" }],
                "isError": true
            })),
            "image" => {
                let data = base64::engine::general_purpose::STANDARD.encode([0x89u8, b'P', b'N', b'G']);
                Ok(json!({
                    "content": [{ "type": "image", "data": data, "mimeType": "image/png" }],
                    "isError": false
                }))
            }
            "sleep" => {
                let ms = int_arg(&args, "ms").unwrap_or(0).max(0) as u64;
                let token = params
                    .get("_meta")
                    .and_then(|m| m.get("progressToken"))
                    .cloned();

                if self.log_level.is_some() {
                    outgoing.push(json!({
                        "jsonrpc": "2.0",
                        "method": "notifications/message",
                        "params": { "level": "info", "logger": "sleep", "data": format!("sleeping {} ms", ms) }
                    }));
                }
                if let Some(token) = token {
                    outgoing.push(json!({
                        "jsonrpc": "2.0",
                        "method": "notifications/progress",
                        "params": { "progressToken": token, "progress": 0, "total": ms }
                    }));
                }

                std::thread::sleep(Duration::from_millis(ms));
                Ok(json!({
                    "content": [{ "type": "text", "text": format!("Slept {} ms", ms) }],
                    "isError": false
                }))
            }
            other => Err((-32602, format!("Unknown tool: {}", other))),
        }
    }
}

fn tool_list() -> Value {
    json!([
        {
            "name": "echo",
            "description": "Echoes the input back",
            "inputSchema": {
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            }
        },
        {
            "name": "add",
            "description": "Adds two integers",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer" }
                },
                "required": ["a", "b"]
            },
            "outputSchema": {
                "type": "object",
                "properties": {
                    "sum": { "type": "integer" },
                    "a": { "type": "integer" },
                    "b": { "type": "integer" }
                }
            }
        },
        {
            "name": "describe",
            "description": "Returns nested structured data",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "fail",
            "description": "Always reports a tool error",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "image",
            "description": "Returns a tiny image",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "sleep",
            "description": "Waits before answering",
            "inputSchema": {
                "type": "object",
                "properties": { "ms": { "type": "integer" } }
            }
        }
    ])
}

fn get_prompt(params: &Value) -> Result<Value, (i64, String)> {
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    if name != "persona_developer" {
        return Err((-32602, format!("Unknown prompt: {}", name)));
    }

    let expertise = params
        .get("arguments")
        .and_then(|a| a.get("expertise"))
        .and_then(Value::as_str)
        .unwrap_or("general");

    Ok(json!({
        "description": "Persona instructions",
        "messages": [{
            "role": "user",
            "content": {
                "type": "text",
                "text": format!("You are an expert Rust developer with {} expertise.", expertise)
            }
        }]
    }))
}

fn read_resource(params: &Value) -> Result<Value, (i64, String)> {
    let uri = params.get("uri").and_then(Value::as_str).unwrap_or("");
    if uri != "mcp://time" {
        return Err((-32002, format!("Resource not found: {}", uri)));
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(json!({
        "contents": [{ "uri": uri, "mimeType": "text/plain", "text": now.to_string() }]
    }))
}

fn string_arg(args: &Map<String, Value>, name: &str) -> String {
    match args.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn int_arg(args: &Map<String, Value>, name: &str) -> Option<i64> {
    args.get(name).and_then(Value::as_i64)
}
