//! Tool-using chat agent
//!
//! Binds the tools discovered from an MCP server to a chat model and runs a
//! ReAct-style loop: the model either answers or asks for tool calls, whose
//! results are fed back until it answers.

pub mod model;
pub mod repl;
pub mod toolset;

use tracing::{debug, info};

use crate::error::{AgentError, Result};

pub use model::{ChatMessage, ChatModel, OpenAiChatModel, Role, ToolCall, ToolSpec};
pub use repl::run_repl;
pub use toolset::McpToolset;

/// Chat model plus the MCP tools it may call
pub struct Agent {
    model: Box<dyn ChatModel>,
    tools: McpToolset,
    max_steps: usize,
}

impl Agent {
    pub fn new(model: impl ChatModel + 'static, tools: McpToolset, max_steps: usize) -> Self {
        Self {
            model: Box::new(model),
            tools,
            max_steps: max_steps.max(1),
        }
    }

    /// Run the conversation until the model produces a reply without tool
    /// calls, making at most `max_steps` model calls.
    pub async fn generate(&self, mut messages: Vec<ChatMessage>) -> Result<ChatMessage> {
        for step in 1..=self.max_steps {
            let reply = self.model.generate(&messages, self.tools.specs()).await?;
            if reply.tool_calls().is_empty() {
                debug!(step, "Agent produced final answer");
                return Ok(reply);
            }

            let calls = reply.tool_calls().to_vec();
            messages.push(reply);

            for call in calls {
                info!(function = %call.function.name, "Invoking tool");
                let output = self
                    .tools
                    .invoke(&call.function.name, &call.function.arguments)
                    .await?;
                messages.push(ChatMessage::tool(call.id, output));
            }
        }

        Err(AgentError::MaxStepsExceeded {
            steps: self.max_steps,
        }
        .into())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::error::TimeMcpError;

    #[tokio::test]
    async fn test_tool_result_fed_back() {
        let model = ScriptedModel::new(vec![
            tool_call_reply(r#"{"timezone":"UTC"}"#),
            ChatMessage::assistant("It is morning in UTC."),
        ]);
        let agent = Agent::new(model.clone(), toolset().await, 12);

        let reply = agent
            .generate(vec![ChatMessage::user("What time is it in UTC?")])
            .await
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("It is morning in UTC."));

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Assistant);
        assert_eq!(second[2].role, Role::Tool);
        assert_eq!(second[2].tool_call_id.as_deref(), Some("call_1"));
        assert!(second[2]
            .content
            .as_deref()
            .unwrap()
            .starts_with("current time is "));
    }

    #[tokio::test]
    async fn test_tool_error_relayed_to_model() {
        let model = ScriptedModel::new(vec![
            tool_call_reply(r#"{"timezone":"Nowhere/Imaginary"}"#),
            ChatMessage::assistant("That zone does not exist."),
        ]);
        let agent = Agent::new(model.clone(), toolset().await, 12);

        agent
            .generate(vec![ChatMessage::user("time on nowhere?")])
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        let tool_message = requests[1].last().unwrap();
        assert!(tool_message
            .content
            .as_deref()
            .unwrap()
            .starts_with("error: parse timezone with error: "));
    }

    #[tokio::test]
    async fn test_max_steps() {
        let model = ScriptedModel::repeating(tool_call_reply(r#"{"timezone":"UTC"}"#));
        let agent = Agent::new(model.clone(), toolset().await, 2);

        let err = agent
            .generate(vec![ChatMessage::user("loop forever")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TimeMcpError::Agent(AgentError::MaxStepsExceeded { steps: 2 })
        ));
        assert_eq!(model.requests.lock().unwrap().len(), 2);
    }
}
