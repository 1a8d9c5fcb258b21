//! Configuration for the current-time MCP server and agent
//!
//! Configuration is built once at startup and passed by value to the
//! components that need it.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Default SSE listen address
pub const DEFAULT_LISTEN: &str = "localhost:8080";

/// Default SSE endpoint used by the agent
pub const DEFAULT_SSE_URL: &str = "http://localhost:8080/sse";

/// Default number of model calls per agent turn
pub const DEFAULT_MAX_STEPS: usize = 12;

/// Transport used by the server (or by the agent to reach it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC over stdin/stdout
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events
    Sse,
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "sse" => Ok(Self::Sse),
            _ => Err(ConfigError::InvalidTransport {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stdio => write!(f, "stdio"),
            TransportKind::Sse => write!(f, "sse"),
        }
    }
}

/// Configuration for the MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Active transport
    pub transport: TransportKind,

    /// SSE listen address (host:port)
    pub listen: String,

    /// Server name reported during the handshake
    pub name: String,

    /// Server version reported during the handshake
    pub version: String,
}

impl ServerConfig {
    /// Create a server configuration, validating the listen address
    pub fn new(transport: TransportKind, listen: impl Into<String>) -> Result<Self> {
        let listen = listen.into();
        validate_listen(&listen)?;

        Ok(Self {
            transport,
            listen,
            ..Self::default()
        })
    }

    /// Base URL advertised to SSE clients
    pub fn base_url(&self) -> String {
        format!("http://{}", self.listen)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            listen: DEFAULT_LISTEN.to_string(),
            name: "current-time".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn validate_listen(listen: &str) -> std::result::Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidListenAddress {
        value: listen.to_string(),
    };

    let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    port.parse::<u16>().map_err(|_| invalid())?;

    Ok(())
}

/// Configuration for the chat model driving the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// OpenAI-compatible API base URL (e.g. `https://api.openai.com/v1`)
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// API key sent as a bearer token
    pub api_key: String,

    /// Maximum model calls per user turn
    pub max_steps: usize,
}

impl AgentConfig {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Full URL of the chat completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
