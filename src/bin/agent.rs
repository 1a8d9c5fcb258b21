//! Interactive agent that reaches the current-time MCP server and lets a
//! chat model call its tools.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;

use current_time_mcp::agent::{run_repl, Agent, McpToolset, OpenAiChatModel};
use current_time_mcp::config::{AgentConfig, TransportKind, DEFAULT_MAX_STEPS, DEFAULT_SSE_URL};
use current_time_mcp::logging;
use current_time_mcp::mcp::client::McpClient;
use current_time_mcp::mcp::types::Implementation;

const CLIENT_NAME: &str = "current-time-agent";

#[derive(Parser)]
#[command(name = "current-time-agent")]
#[command(author, version, about = "Chat agent backed by the current-time MCP server")]
struct Cli {
    /// How to reach the MCP server
    #[arg(long, value_enum, default_value_t = TransportKind::Sse)]
    transport: TransportKind,

    /// SSE endpoint of the server
    #[arg(long, default_value = DEFAULT_SSE_URL)]
    sse_url: String,

    /// Server program to spawn for the stdio transport
    #[arg(long, default_value = "current-time-server")]
    server_command: String,

    /// Extra argument for the spawned server (repeatable)
    #[arg(long = "server-arg")]
    server_args: Vec<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_API_URL", default_value = "https://api.openai.com/v1")]
    api_url: String,

    /// Model identifier
    #[arg(long, env = "MODEL_ID")]
    model: String,

    /// API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Maximum model calls per request
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let client = match cli.transport {
        TransportKind::Sse => McpClient::connect_sse(&cli.sse_url)
            .await
            .with_context(|| format!("connecting to {}", cli.sse_url))?,
        TransportKind::Stdio => McpClient::spawn_stdio(&cli.server_command, &cli.server_args)
            .with_context(|| format!("spawning {}", cli.server_command))?,
    };
    let client = Arc::new(client);

    client
        .initialize(Implementation::new(CLIENT_NAME, env!("CARGO_PKG_VERSION")))
        .await
        .context("MCP handshake failed")?;
    let tools = McpToolset::discover(client.clone()).await?;
    if tools.is_empty() {
        tracing::warn!("Server exposes no tools; the model will answer unaided");
    }

    let mut config = AgentConfig::new(cli.api_url, cli.model, cli.api_key);
    config.max_steps = cli.max_steps;
    let max_steps = config.max_steps;
    let agent = Agent::new(OpenAiChatModel::new(config), tools, max_steps);

    let result = run_repl(&agent, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await;
    if let Err(e) = &result {
        tracing::error!("run agent with error: {}", e);
    }

    client.close().await?;
    Ok(result?)
}
