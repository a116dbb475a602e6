//! mcp-tester - scripted testing for MCP servers
//!
//! Connects to a Model Context Protocol server over stdio or HTTP and runs
//! test scripts, single tool calls, or a quality inspection against it.

use clap::Parser;
use mcp_tester::commands::{Commands, ServerArgs};
use mcp_tester::{cli, common::logging};

#[derive(Parser)]
#[command(name = "mcp-tester", about = "Test tool for MCP servers")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.server.verbose);

    if let Err(e) = cli::dispatch(cli.command, &cli.server).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
