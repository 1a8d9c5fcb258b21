//! MCP client
//!
//! Performs the initialize handshake and then discovers and invokes tools
//! over any [`ClientTransport`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{McpError, Result};
use crate::mcp::server::McpServer;
use crate::mcp::transport::{self, ClientTransport, SseClientTransport, StdioClientTransport};
use crate::mcp::types::*;

/// MCP client session
pub struct McpClient {
    transport: Box<dyn ClientTransport>,
    next_id: AtomicI64,
    /// Set once the handshake has completed
    server: RwLock<Option<InitializeResult>>,
}

impl McpClient {
    /// Create a client over an established transport
    pub fn new(transport: impl ClientTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            next_id: AtomicI64::new(1),
            server: RwLock::new(None),
        }
    }

    /// Connect to an SSE server (e.g. `http://localhost:8080/sse`)
    pub async fn connect_sse(url: &str) -> Result<Self> {
        Ok(Self::new(SseClientTransport::connect(url).await?))
    }

    /// Spawn a stdio server process and connect to it
    pub fn spawn_stdio(program: &str, args: &[String]) -> Result<Self> {
        Ok(Self::new(StdioClientTransport::spawn(program, args)?))
    }

    /// Connect to a server running on a background task of this process
    pub fn in_process(server: Arc<McpServer>) -> Self {
        Self::new(transport::in_process(server))
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        debug!(method, ?id, "Sending request");

        let response = self
            .transport
            .request(JsonRpcRequest::new(id, method, params))
            .await?;
        Ok(response.into_result()?)
    }

    /// Perform the initialize handshake.
    ///
    /// Must complete before tools can be listed or called.
    pub async fn initialize(&self, client_info: Implementation) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            client_info,
            capabilities: ClientCapabilities::default(),
        };

        let value = self
            .request(methods::INITIALIZE, Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(value)?;

        if result.protocol_version != MCP_VERSION {
            warn!(
                "Server negotiated protocol {} (requested {})",
                result.protocol_version, MCP_VERSION
            );
        }

        self.transport
            .notify(JsonRpcNotification::new(methods::INITIALIZED))
            .await?;

        info!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            "MCP handshake complete"
        );
        *self.server.write().await = Some(result.clone());

        Ok(result)
    }

    pub async fn is_initialized(&self) -> bool {
        self.server.read().await.is_some()
    }

    async fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(McpError::NotInitialized.into())
        }
    }

    /// List the server's tools
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_initialized().await?;

        let value = self.request(methods::LIST_TOOLS, None).await?;
        let result: ListToolsResult = serde_json::from_value(value)?;
        Ok(result.tools)
    }

    /// Invoke a tool; server-side failures surface as [`McpError::Rpc`]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.ensure_initialized().await?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let value = self
            .request(methods::CALL_TOOL, Some(serde_json::to_value(params)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn ping(&self) -> Result<()> {
        self.request(methods::PING, None).await?;
        Ok(())
    }

    /// Close the underlying transport
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }
}
