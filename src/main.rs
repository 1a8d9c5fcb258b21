//! Current-time MCP server
//!
//! Serves the "current time" tool over stdio (default) or Server-Sent Events.

use clap::Parser;

use current_time_mcp::config::{ServerConfig, TransportKind, DEFAULT_LISTEN};
use current_time_mcp::logging;
use current_time_mcp::mcp::server::McpServer;

/// Current-time MCP server
#[derive(Parser)]
#[command(name = "current-time-server")]
#[command(
    author,
    version,
    about = "MCP server exposing the current time in any IANA time zone. \
             Flags take two dashes (--transport, --server_listen); \
             the single-dash -transport and -server_listen spellings are not accepted."
)]
struct Cli {
    /// The transport to use
    #[arg(long, value_enum, default_value_t = TransportKind::Stdio)]
    transport: TransportKind,

    /// The SSE server listen address
    #[arg(long = "server_listen", alias = "server-listen", default_value = DEFAULT_LISTEN)]
    server_listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = ServerConfig::new(cli.transport, cli.server_listen)?;

    let server = McpServer::new(&config);
    if let Err(e) = server.run(config).await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
