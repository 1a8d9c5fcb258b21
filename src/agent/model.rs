//! Chat model abstraction and the OpenAI-compatible client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message of a chat conversation, in the OpenAI wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_content(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_content(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_content(Role::Assistant, content)
    }

    /// Result of a tool call, answering the call with `tool_call_id`
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_content(Role::Tool, content)
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,

    pub function: FunctionCall,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// JSON-encoded arguments, as produced by the model
    #[serde(default)]
    pub arguments: String,
}

/// A function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,

    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parameters: Value,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolSpec {
    pub fn function(name: impl Into<String>, description: Option<String>, parameters: Value) -> Self {
        Self {
            kind: function_kind(),
            function: FunctionSpec {
                name: name.into(),
                description,
                parameters,
            },
        }
    }
}

/// A model that produces the next assistant message of a conversation
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolSpec],
}

fn no_tools(tools: &&[ToolSpec]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiChatModel {
    config: AgentConfig,
    http_client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn generate(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage> {
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            tools,
        };

        let response = self
            .http_client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let response: ChatResponse = response.json().await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(AgentError::NoChoices)?;

        debug!(
            tool_calls = message.tool_calls().len(),
            "Chat model replied"
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    #[test]
    fn test_message_wire_shape() {
        let value = serde_json::to_value(ChatMessage::tool("call_1", "done")).unwrap();
        assert_eq!(
            value,
            json!({"role": "tool", "content": "done", "tool_call_id": "call_1"})
        );

        let reply: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "current_time", "arguments": "{\"timezone\":\"UTC\"}"}
            }]
        }))
        .unwrap();
        assert_eq!(reply.content, None);
        assert_eq!(reply.tool_calls()[0].function.name, "current_time");
    }

    #[test]
    fn test_null_tool_calls() {
        let reply: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "hi",
            "tool_calls": null
        }))
        .unwrap();
        assert!(reply.tool_calls().is_empty());
    }

    async fn completions(
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }
        let tools = body["tools"].as_array().map(|t| t.len()).unwrap_or(0);
        (
            StatusCode::OK,
            Json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": format!(
                            "{} says hello with {} tools",
                            body["model"].as_str().unwrap_or(""),
                            tools
                        )
                    }
                }]
            })),
        )
    }

    async fn mock_base_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/v1/chat/completions", post(completions));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn test_openai_chat_model() {
        let base_url = mock_base_url().await;
        let model = OpenAiChatModel::new(AgentConfig::new(&base_url, "test-model", "secret"));
        let tools = vec![ToolSpec::function("current_time", None, json!({"type": "object"}))];

        let reply = model
            .generate(&[ChatMessage::user("hello")], &tools)
            .await
            .unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(
            reply.content.as_deref(),
            Some("test-model says hello with 1 tools")
        );
    }

    #[tokio::test]
    async fn test_openai_chat_model_api_error() {
        let base_url = mock_base_url().await;
        let model = OpenAiChatModel::new(AgentConfig::new(&base_url, "test-model", "wrong"));

        let err = model
            .generate(&[ChatMessage::user("hello")], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::TimeMcpError::Agent(AgentError::Api { status: 401, .. })
        ));
    }
}
