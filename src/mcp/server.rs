//! MCP Server implementation
//!
//! Protocol dispatch shared by every transport, plus the stdio transport.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::{ServerConfig, TransportKind};
use crate::error::Result;
use crate::mcp::sse;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server for the current-time tool
pub struct McpServer {
    /// Name and version reported during the handshake
    info: Implementation,

    /// Tool handler
    tool_handler: ToolHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            info: Implementation::new(&config.name, &config.version),
            tool_handler: ToolHandler::new(),
        }
    }

    /// Serve on the transport selected in `config` until it shuts down
    pub async fn run(self, config: ServerConfig) -> Result<()> {
        let server = Arc::new(self);
        match config.transport {
            TransportKind::Stdio => server.run_stdio().await,
            TransportKind::Sse => sse::run(server, &config).await,
        }
    }

    /// Run the server on stdio
    pub async fn run_stdio(&self) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve_lines(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC until the reader reaches end of input
    pub async fn serve_lines<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_message(line).await,
                Err(e) => {
                    warn!("Received a line that is not valid UTF-8: {}", e);
                    Some(JsonRpcResponse::error(
                        None,
                        JsonRpcError::parse_error(e.to_string()),
                    ))
                }
            };

            if let Some(response) = response {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                writer.write_all(response_str.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        debug!("Input closed, stopping stdio server");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(req) => req,
            Err(e) => {
                warn!("Message is not a JSON-RPC request: {}", e);
                let id = value
                    .get("id")
                    .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(e.to_string()),
                ));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let id = request.id.clone();
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported JSON-RPC version: {}",
                    request.jsonrpc
                )),
            ));
        }

        debug!(method = %request.method, "Handling request");
        let response = match request.method.as_str() {
            methods::INITIALIZE => JsonRpcResponse::success(id, self.handle_initialize(&request)),
            methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),
            methods::LIST_TOOLS => JsonRpcResponse::success(id, self.handle_list_tools()),
            methods::CALL_TOOL => match self.handle_call_tool(&request).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(error) => JsonRpcResponse::error(id, error),
            },
            _ => JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method)),
        };

        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => info!("Client completed initialization"),
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: &JsonRpcRequest) -> Value {
        let client = request
            .params
            .clone()
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok());
        if let Some(params) = &client {
            info!(
                client = %params.client_info.name,
                version = %params.client_info.version,
                protocol = %params.protocol_version,
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: self.info.clone(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
        };

        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Value {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    /// Handle call tool request
    async fn handle_call_tool(
        &self,
        request: &JsonRpcRequest,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = match request.params.clone() {
            Some(p) => serde_json::from_value(p).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e))
            })?,
            None => return Err(JsonRpcError::invalid_params("Missing tool parameters")),
        };

        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await
            .map_err(|e| {
                warn!(tool = %params.name, "Tool call failed: {}", e);
                JsonRpcError::from(&e)
            })?;

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}
