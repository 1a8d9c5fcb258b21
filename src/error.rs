//! Error types for the current-time MCP server and agent
//!
//! This module defines the error hierarchy for all operations in the crate.

use thiserror::Error;

/// Main error type for the current-time MCP crate
#[derive(Error, Debug)]
pub enum TimeMcpError {
    /// Tool invocation errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol and transport errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Chat model / agent loop errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors returned by a tool handler.
///
/// These never terminate the server; they are reported back to the caller
/// as a JSON-RPC error object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("parse timezone with error: {0}")]
    Resolution(String),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid transport: {value} (expected \"stdio\" or \"sse\")")]
    InvalidTransport { value: String },

    #[error("Invalid listen address: {value} (expected host:port)")]
    InvalidListenAddress { value: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Client is not initialized; call initialize first")]
    NotInitialized,

    #[error("Server returned error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Chat model and agent loop errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Chat model request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Chat model returned no choices")]
    NoChoices,

    #[error("Agent exceeded {steps} steps without a final answer")]
    MaxStepsExceeded { steps: usize },
}

/// Result type alias for current-time MCP operations
pub type Result<T> = std::result::Result<T, TimeMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::InvalidArgument {
            message: "timezone must be a string".to_string(),
        };
        assert_eq!(err.to_string(), "timezone must be a string");

        let err = ToolError::Resolution("unknown zone".to_string());
        assert_eq!(err.to_string(), "parse timezone with error: unknown zone");
    }

    #[test]
    fn test_error_conversion() {
        let mcp_err = McpError::NotInitialized;
        let err: TimeMcpError = mcp_err.into();
        assert!(matches!(err, TimeMcpError::Mcp(McpError::NotInitialized)));
    }

    #[test]
    fn test_bind_error_keeps_address() {
        let err = McpError::Bind {
            addr: "localhost:8080".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("localhost:8080"));
    }
}
