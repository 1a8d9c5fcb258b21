//! Interactive read-eval-print loop around an [`Agent`]

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::{Agent, ChatMessage};
use crate::error::Result;

const WELCOME: &str = "Welcome to the current-time MCP agent.\n";
const PROMPT: &str = "\nEnter a request: ";
const GOODBYE: &str = "Goodbye.\n";
const INPUT_CLOSED: &str = "Input closed, exiting.\n";

/// Read requests line by line and print the agent's answers.
///
/// Each line is answered as an independent conversation. Returns when the
/// user types `exit` or `bye`, or when input ends. Model errors are
/// returned to the caller.
pub async fn run_repl<R, W>(agent: &Agent, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(WELCOME.as_bytes()).await?;
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(INPUT_CLOSED.as_bytes()).await?;
            output.flush().await?;
            return Ok(());
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if matches!(line.to_lowercase().as_str(), "exit" | "bye") {
            output.write_all(GOODBYE.as_bytes()).await?;
            output.flush().await?;
            return Ok(());
        }

        let reply = agent.generate(vec![ChatMessage::user(line)]).await?;
        let mut text = reply.content.unwrap_or_default();
        text.push('\n');
        output.write_all(text.as_bytes()).await?;
    }
}
