//! In-process doubles for runner tests

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{InputSource, ToolInvoker};
use crate::common::Result;
use crate::mcp::ToolDescriptor;

struct MockTool {
    descriptor: ToolDescriptor,
    result: Value,
    delay: Option<Duration>,
}

/// A tool server that answers every call with a canned result
#[derive(Default)]
pub struct MockInvoker {
    tools: HashMap<String, MockTool>,
    /// Every call made, in order
    pub calls: Vec<(String, Map<String, Value>)>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool whose properties all have the given types
    pub fn tool(self, name: &str, properties: &[(&str, &str)], result: Value) -> Self {
        self.register(name, properties, result, None)
    }

    /// Register a tool that sleeps before answering
    pub fn slow_tool(self, name: &str, delay: Duration, result: Value) -> Self {
        self.register(name, &[], result, Some(delay))
    }

    fn register(
        mut self,
        name: &str,
        properties: &[(&str, &str)],
        result: Value,
        delay: Option<Duration>,
    ) -> Self {
        let props: Map<String, Value> = properties
            .iter()
            .map(|(prop, ty)| (prop.to_string(), json!({ "type": ty })))
            .collect();
        let descriptor = ToolDescriptor {
            name: name.to_string(),
            input_schema: Some(json!({ "type": "object", "properties": props })),
            ..Default::default()
        };
        self.tools.insert(
            name.to_string(),
            MockTool {
                descriptor,
                result,
                delay,
            },
        );
        self
    }
}

#[async_trait]
impl ToolInvoker for MockInvoker {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let mut tools: Vec<ToolDescriptor> =
            self.tools.values().map(|t| t.descriptor.clone()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        self.calls.push((name.to_string(), arguments));
        let tool = &self.tools[name];
        if let Some(delay) = tool.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(tool.result.clone())
    }
}

/// Operator input fed from a fixed list of lines
#[derive(Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    /// Prompts shown, in order
    pub prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}

/// A `tools/call` result with a single text fragment
pub fn text_result(text: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false
    })
}
