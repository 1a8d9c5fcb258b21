//! Current-time MCP library
//!
//! A Model Context Protocol (MCP) server exposing a "current time" tool over
//! stdio or Server-Sent Events, and a client/agent that discovers the tool and
//! lets a chat model call it.

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod time;

pub use config::{AgentConfig, ServerConfig, TransportKind};
pub use error::{Result, TimeMcpError};
