//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server and client for tool discovery and invocation.

pub mod client;
pub mod server;
pub mod sse;
pub mod tools;
pub mod transport;
pub mod types;
