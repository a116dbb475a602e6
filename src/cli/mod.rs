//! CLI command handling
//!
//! Connects to the configured server, dispatches CLI commands, and formats
//! output.

use std::path::Path;

use colored::Colorize;
use serde_json::{Map, Value};

use crate::commands::{Commands, PromptCommands, ResourceCommands, ServerArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::mcp::{self, McpClient, ToolDescriptor};
use crate::scripting::{Runner, StdinInput};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, server: &ServerArgs) -> Result<()> {
    let config = Config::load(server.config.as_deref())?;
    let target = config.resolve_target(
        server.profile.as_deref(),
        server.command.as_deref(),
        server.url.as_deref(),
    )?;

    // Fail on an unreadable script before starting a server
    let script = match &command {
        Commands::Test { script } => Some(read_script(script)?),
        _ => None,
    };

    let mut client = McpClient::connect(&target, &config.timeouts).await?;

    if server.verbose {
        if let Err(e) = client.set_logging_level("debug").await {
            tracing::debug!("Server does not accept logging/setLevel: {}", e);
        }
    }

    let result = execute(command, script, &mut client, server).await;

    if let Err(e) = client.close().await {
        tracing::debug!("Error closing connection: {}", e);
    }

    result
}

async fn execute(
    command: Commands,
    script: Option<String>,
    client: &mut McpClient,
    server: &ServerArgs,
) -> Result<()> {
    match command {
        Commands::Test { .. } => {
            let script = script.unwrap_or_default();
            let mut runner = Runner::new(client, StdinInput::new()).raw_output(server.raw);
            runner.run(&script).await.map(|_| ())
        }

        Commands::List => list_tools(client, server.raw).await,

        Commands::Call { tool, args } => call_tool(client, &tool, &args, server.raw).await,

        Commands::Prompts(PromptCommands::List) => list_prompts(client).await,

        Commands::Prompts(PromptCommands::Get { name, args }) => {
            let arguments = parse_json_object(&args)?;
            let result = client.get_prompt(&name, arguments).await?;
            println!("Prompt Result:\n{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Resources(ResourceCommands::List) => list_resources(client).await,

        Commands::Resources(ResourceCommands::Read { uri }) => {
            let result = client.read_resource(&uri).await?;
            println!("Resource Content:\n{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Inspect => {
            let title = server.profile.as_deref().unwrap_or("server");
            inspect(client, title).await
        }
    }
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

/// Parse a `--args` value, which must be a JSON object
fn parse_json_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Dispatch(format!(
            "--args must be a JSON object, got {}",
            other
        ))),
    }
}

async fn list_tools(client: &mut McpClient, raw: bool) -> Result<()> {
    let tools = client.list_tools().await?;

    if raw {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    if tools.is_empty() {
        println!("No tools available");
        return Ok(());
    }

    for tool in &tools {
        println!("{} {}", "Tool:".bold(), tool.name.cyan());
        println!(
            "Description: {}",
            tool.description.as_deref().unwrap_or("")
        );
        match &tool.input_schema {
            Some(schema) => println!("Schema: {}", schema),
            None => println!("Schema: {}", "none".dimmed()),
        }
        println!("---");
    }

    Ok(())
}

async fn call_tool(client: &mut McpClient, tool: &str, args: &str, raw: bool) -> Result<()> {
    let arguments = parse_json_object(args)?;
    let result = client.call_tool(tool, arguments).await?;

    if raw {
        println!("--- RAW MODE ---");
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for (i, fragment) in mcp::content_fragments(&result).enumerate() {
        let kind = fragment.get("type").and_then(Value::as_str).unwrap_or("unknown");
        println!("Content {} ({}):", i, kind);
        println!("{}", mcp::describe_fragment(fragment));
    }

    if let Some(structured) = result.get("structuredContent").filter(|v| !v.is_null()) {
        println!("StructuredContent:\n{}", serde_json::to_string_pretty(structured)?);
    }

    if mcp::is_error_result(&result) {
        println!("{}", "Result indicated an error.".red());
    }

    Ok(())
}

async fn list_prompts(client: &mut McpClient) -> Result<()> {
    let prompts = client.list_prompts().await?;

    if prompts.is_empty() {
        println!("No prompts available");
        return Ok(());
    }

    for prompt in &prompts {
        println!("{} {}", "Prompt:".bold(), prompt.name.cyan());
        println!("  Desc: {}", prompt.description.as_deref().unwrap_or(""));
        if !prompt.arguments.is_empty() {
            println!("  Arguments:");
            for arg in &prompt.arguments {
                println!(
                    "    - {}: {} (required: {})",
                    arg.name,
                    arg.description.as_deref().unwrap_or(""),
                    arg.required
                );
            }
        }
        println!("---");
    }

    Ok(())
}

async fn list_resources(client: &mut McpClient) -> Result<()> {
    let resources = client.list_resources().await?;

    if resources.is_empty() {
        println!("No resources available");
        return Ok(());
    }

    for resource in &resources {
        println!("{} {}", "Resource:".bold(), resource.name.cyan());
        println!("  URI:  {}", resource.uri);
        println!("  Desc: {}", resource.description.as_deref().unwrap_or(""));
        if let Some(mime) = &resource.mime_type {
            println!("  Type: {}", mime);
        }
        println!("---");
    }

    Ok(())
}

/// Quality findings for a server, with the score they add up to
#[derive(Debug)]
struct Inspection {
    score: i32,
    recommendations: Vec<String>,
}

impl Inspection {
    fn new() -> Self {
        Self {
            score: 100,
            recommendations: Vec::new(),
        }
    }

    fn penalize(&mut self, points: i32, recommendation: String) {
        self.score -= points;
        self.recommendations.push(recommendation);
    }

    /// Score prompt support; `None` means listing prompts failed
    fn check_prompts(&mut self, prompt_count: Option<usize>) {
        match prompt_count {
            Some(0) => self.penalize(
                20,
                "WARNING: No prompts defined. Prompts are strongly recommended to give the model the server's context and persona.".to_string(),
            ),
            Some(_) => {}
            None => self.penalize(
                10,
                "WARNING: The server does not support prompts (or listing them failed).".to_string(),
            ),
        }
    }

    fn check_tools(&mut self, tools: &[ToolDescriptor]) {
        if tools.is_empty() {
            self.recommendations
                .push("INFO: The server offers no tools.".to_string());
            return;
        }

        for tool in tools {
            if tool.description.as_deref().map_or(true, str::is_empty) {
                self.penalize(
                    5,
                    format!(
                        "WARNING: Tool '{}' has no description. The model needs one to understand what the tool is for.",
                        tool.name
                    ),
                );
            }
            if tool.input_schema.is_none() {
                self.penalize(10, format!("ERROR: Tool '{}' has no input schema.", tool.name));
            }
            if tool.output_schema.is_none() {
                self.penalize(
                    2,
                    format!(
                        "NOTE: Tool '{}' has no output schema. Structured results help the model process them precisely.",
                        tool.name
                    ),
                );
            }
        }
    }
}

async fn inspect(client: &mut McpClient, title: &str) -> Result<()> {
    println!("=== MCP Server Inspection: {} ===\n", title);

    let info = &client.server;
    println!(
        "[{}] Server: {} ({})",
        "✓".green(),
        info.server_info.name,
        info.server_info.version
    );
    println!("[{}] Protocol Version: {}", "✓".green(), info.protocol_version);
    println!("[i] Capabilities: {}", info.capabilities.names().join(", "));

    let mut report = Inspection::new();

    let prompts = client.list_prompts().await.ok();
    if let Some(prompts) = prompts.as_ref().filter(|p| !p.is_empty()) {
        println!("[{}] {} prompts found.", "✓".green(), prompts.len());
    }
    report.check_prompts(prompts.as_ref().map(Vec::len));

    if let Ok(tools) = client.list_tools().await {
        if !tools.is_empty() {
            println!("[{}] {} tools found.", "✓".green(), tools.len());
        }
        report.check_tools(&tools);
    }

    if let Ok(resources) = client.list_resources().await {
        if !resources.is_empty() {
            println!("[{}] {} resources found.", "✓".green(), resources.len());
        }
    }

    println!("\n--- Quality Report (Score: {}/100) ---", report.score);
    if report.recommendations.is_empty() {
        println!("{}", "The server follows every recommendation.".green());
    } else {
        for recommendation in &report.recommendations {
            println!("- {}", recommendation);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(description: Option<&str>, input: bool, output: bool) -> ToolDescriptor {
        ToolDescriptor {
            name: "t".to_string(),
            description: description.map(String::from),
            input_schema: input.then(|| json!({ "type": "object" })),
            output_schema: output.then(|| json!({ "type": "object" })),
        }
    }

    #[test]
    fn test_parse_json_object() {
        let map = parse_json_object(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(map["message"], json!("hi"));
        assert!(parse_json_object("{}").unwrap().is_empty());
        assert!(matches!(parse_json_object("[1]"), Err(Error::Dispatch(_))));
        assert!(matches!(parse_json_object("{broken"), Err(Error::Json(_))));
    }

    #[test]
    fn test_inspection_perfect_server() {
        let mut report = Inspection::new();
        report.check_prompts(Some(1));
        report.check_tools(&[tool(Some("does things"), true, true)]);
        assert_eq!(report.score, 100);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_inspection_penalties() {
        let mut report = Inspection::new();
        report.check_prompts(Some(0));
        report.check_tools(&[tool(None, false, false), tool(Some(""), true, false)]);
        // 20 + (5 + 10 + 2) + (5 + 2)
        assert_eq!(report.score, 56);
        assert_eq!(report.recommendations.len(), 6);
    }

    #[test]
    fn test_inspection_prompts_unsupported() {
        let mut report = Inspection::new();
        report.check_prompts(None);
        report.check_tools(&[]);
        assert_eq!(report.score, 90);
        assert_eq!(report.recommendations.len(), 2);
    }
}
