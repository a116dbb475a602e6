//! CLI command definitions
//!
//! Defines the clap commands for the mcp-tester CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// How to reach the server, shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Shell command that starts a stdio MCP server
    #[arg(short = 'c', long, global = true)]
    pub command: Option<String>,

    /// URL of an HTTP MCP server
    #[arg(short = 'u', long, global = true)]
    pub url: Option<String>,

    /// Profile from the configuration file
    #[arg(short = 'p', long, global = true)]
    pub profile: Option<String>,

    /// Configuration file (default: ./mcp-tester.yml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging, including server log messages
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Print raw JSON results
    #[arg(short = 'r', long, global = true)]
    pub raw: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test script against the server
    Test {
        /// Path to the script file
        #[arg(short = 's', long)]
        script: PathBuf,
    },

    /// List the tools the server provides
    List,

    /// Call a tool with JSON arguments
    Call {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short = 'a', long, default_value = "{}")]
        args: String,
    },

    /// Prompt management
    #[command(subcommand)]
    Prompts(PromptCommands),

    /// Resource management
    #[command(subcommand)]
    Resources(ResourceCommands),

    /// Analyze the server and report quality recommendations
    Inspect,
}

#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// List available prompts
    List,

    /// Render a prompt
    Get {
        /// Prompt name
        name: String,

        /// Prompt arguments as a JSON object of strings
        #[arg(short = 'a', long, default_value = "{}")]
        args: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommands {
    /// List available resources
    List,

    /// Read a resource by URI
    Read {
        /// Resource URI
        uri: String,
    },
}
