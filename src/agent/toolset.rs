//! MCP tools exposed to the chat model as callable functions

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::agent::model::ToolSpec;
use crate::error::{McpError, Result, TimeMcpError};
use crate::mcp::client::McpClient;
use crate::mcp::types::Tool;

/// Snapshot of a server's tools, taken once per session
pub struct McpToolset {
    client: Arc<McpClient>,
    specs: Vec<ToolSpec>,
    /// Function name shown to the model -> MCP tool name
    names: HashMap<String, String>,
}

impl McpToolset {
    /// List the server's tools; the client must already be initialized
    pub async fn discover(client: Arc<McpClient>) -> Result<Self> {
        let tools = client.list_tools().await?;
        info!("Discovered {} MCP tool(s)", tools.len());
        Ok(Self::from_tools(client, tools))
    }

    fn from_tools(client: Arc<McpClient>, tools: Vec<Tool>) -> Self {
        let mut specs = Vec::with_capacity(tools.len());
        let mut names = HashMap::new();

        for tool in tools {
            let base = function_name(&tool.name);
            let mut name = base.clone();
            let mut suffix = 2;
            while names.contains_key(&name) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }

            specs.push(ToolSpec::function(
                &name,
                tool.description.clone(),
                tool.input_schema.clone(),
            ));
            names.insert(name, tool.name);
        }

        Self {
            client,
            specs,
            names,
        }
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Invoke the tool behind `function` with the model's JSON arguments.
    ///
    /// Failures the model can react to come back as `error: ...` text;
    /// only transport failures are returned as errors.
    pub async fn invoke(&self, function: &str, arguments: &str) -> Result<String> {
        let Some(tool) = self.names.get(function) else {
            warn!(function, "Model called an unknown function");
            return Ok(format!("error: unknown tool {}", function));
        };

        let arguments: Value = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(arguments) {
                Ok(value) => value,
                Err(e) => return Ok(format!("error: invalid tool arguments: {}", e)),
            }
        };

        match self.client.call_tool(tool, arguments).await {
            Ok(result) if result.is_error => Ok(format!("error: {}", result.joined_text())),
            Ok(result) => Ok(result.joined_text()),
            Err(TimeMcpError::Mcp(McpError::Rpc { message, .. })) => {
                warn!(tool = %tool, "Tool call failed: {}", message);
                Ok(format!("error: {}", message))
            }
            Err(e) => Err(e),
        }
    }
}

/// Map an MCP tool name onto the `[A-Za-z0-9_-]` alphabet function names
/// are restricted to.
pub fn function_name(tool_name: &str) -> String {
    let name: String = tool_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "tool".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::mcp::server::McpServer;
    use crate::mcp::types::Implementation;
    use serde_json::json;

    async fn toolset() -> McpToolset {
        let client = Arc::new(McpClient::in_process(Arc::new(McpServer::new(
            &ServerConfig::default(),
        ))));
        client
            .initialize(Implementation::new("test", "1.0.0"))
            .await
            .unwrap();
        McpToolset::discover(client).await.unwrap()
    }

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("current time"), "current_time");
        assert_eq!(function_name("get-weather_v2"), "get-weather_v2");
        assert_eq!(function_name("  "), "tool");
    }

    #[tokio::test]
    async fn test_specs_use_sanitized_names() {
        let toolset = toolset().await;
        assert!(!toolset.is_empty());
        assert_eq!(toolset.specs().len(), 1);
        let spec = &toolset.specs()[0];
        assert_eq!(spec.kind, "function");
        assert_eq!(spec.function.name, "current_time");
        assert_eq!(
            spec.function.parameters["properties"]["timezone"]["type"],
            "string"
        );
    }

    #[tokio::test]
    async fn test_colliding_names_get_suffix() {
        let client = Arc::new(McpClient::in_process(Arc::new(McpServer::new(
            &ServerConfig::default(),
        ))));
        let tool = |name: &str| Tool {
            name: name.to_string(),
            description: None,
            input_schema: json!({"type": "object"}),
        };
        let toolset =
            McpToolset::from_tools(client, vec![tool("a b"), tool("a_b"), tool("a.b")]);
        let names: Vec<_> = toolset
            .specs()
            .iter()
            .map(|s| s.function.name.as_str())
            .collect();
        assert_eq!(names, vec!["a_b", "a_b_2", "a_b_3"]);
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let client = Arc::new(McpClient::in_process(Arc::new(McpServer::new(
            &ServerConfig::default(),
        ))));
        assert!(McpToolset::from_tools(client, vec![]).is_empty());
    }

    #[tokio::test]
    async fn test_invoke_relays_failures() {
        let toolset = toolset().await;

        let text = toolset
            .invoke("current_time", r#"{"timezone":"UTC"}"#)
            .await
            .unwrap();
        assert!(text.starts_with("current time is "));

        let text = toolset
            .invoke("current_time", r#"{"timezone":5}"#)
            .await
            .unwrap();
        assert_eq!(text, "error: timezone must be a string");

        let text = toolset.invoke("current_time", "").await.unwrap();
        assert_eq!(text, "error: timezone must be a string");

        let text = toolset.invoke("current_time", "{oops").await.unwrap();
        assert!(text.starts_with("error: invalid tool arguments"));

        let text = toolset.invoke("weather", "{}").await.unwrap();
        assert_eq!(text, "error: unknown tool weather");
    }
}
