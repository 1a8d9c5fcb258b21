//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations.

use serde_json::Value;

use crate::error::ToolError;
use crate::mcp::types::{CallToolResult, Tool};
use crate::time;

/// Tool handler
#[derive(Debug, Clone)]
pub struct ToolHandler {
    tools: Vec<Tool>,
}

impl ToolHandler {
    /// Create a new tool handler with every tool registered
    pub fn new() -> Self {
        Self {
            tools: vec![tool_def(
                time::TOOL_NAME,
                time::TOOL_DESCRIPTION,
                time::input_schema(),
            )],
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, ToolError> {
        match name {
            time::TOOL_NAME => self.handle_current_time(args),
            _ => Err(ToolError::UnknownTool {
                name: name.to_string(),
            }),
        }
    }

    fn handle_current_time(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let text = time::current_time(args)?;
        Ok(CallToolResult::text(text))
    }
}

impl Default for ToolHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}
