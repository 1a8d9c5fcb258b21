//! Client-side MCP transports
//!
//! - `LineTransport`: newline-delimited JSON-RPC over any async byte pipe
//! - `StdioClientTransport`: spawns the server and talks over its stdio
//! - `SseClientTransport`: HTTP + Server-Sent Events
//!
//! Every transport carries a single in-flight request at a time.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadHalf,
    WriteHalf,
};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{ConfigError, McpError, Result};
use crate::mcp::server::McpServer;
use crate::mcp::types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// How long a spawned server gets to exit after its stdin closes
const CHILD_EXIT_GRACE: Duration = Duration::from_secs(5);

/// A channel able to carry JSON-RPC traffic to an MCP server
#[async_trait]
pub trait ClientTransport: Send + Sync {
    /// Send a request and wait for the response with the same id
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse>;

    /// Send a notification; no response is expected
    async fn notify(&self, notification: JsonRpcNotification) -> Result<()>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()>;
}

/// Decode a server message, returning `None` for server-initiated
/// requests and notifications.
fn decode_incoming(text: &str) -> Result<Option<JsonRpcResponse>> {
    let value: Value = serde_json::from_str(text)?;
    if value.get("method").is_some() {
        trace!("Skipping server-initiated message: {}", text);
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

// ==================== Line transport ====================

/// Newline-delimited JSON-RPC over an async reader/writer pair
pub struct LineTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<Option<W>>,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(Some(writer)),
        }
    }

    async fn write_message<T: Serialize + Sync>(&self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(McpError::ConnectionClosed)?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> ClientTransport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let mut reader = self.reader.lock().await;
        self.write_message(&request).await?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Err(McpError::ConnectionClosed.into());
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => line,
                Err(e) => {
                    warn!("Skipping server line that is not valid UTF-8: {}", e);
                    continue;
                }
            };

            match decode_incoming(line)? {
                Some(response) if response.id == request.id => return Ok(response),
                Some(response) => {
                    warn!("Dropping response with unexpected id {:?}", response.id)
                }
                None => {}
            }
        }
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        self.write_message(&notification).await
    }

    async fn close(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}

/// Line transport connected to a server running in the same process
pub type InProcessTransport =
    LineTransport<BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>>;

/// Run `server` on a background task and return a transport wired to it
pub fn in_process(server: Arc<McpServer>) -> InProcessTransport {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);

    tokio::spawn(async move {
        if let Err(e) = server
            .serve_lines(BufReader::new(server_read), server_write)
            .await
        {
            warn!("In-process server stopped: {}", e);
        }
    });

    let (client_read, client_write) = tokio::io::split(client_io);
    LineTransport::new(BufReader::new(client_read), client_write)
}

// ==================== Stdio transport ====================

/// Spawns an MCP server process and speaks JSON-RPC over its pipes
pub struct StdioClientTransport {
    inner: LineTransport<BufReader<ChildStdout>, ChildStdin>,
    child: Mutex<Child>,
}

impl StdioClientTransport {
    /// Spawn `program` with `args`; its stderr is inherited
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let pipe_error = |name: &str| McpError::TransportError {
            message: format!("child {} is not available", name),
        };
        let stdin = child.stdin.take().ok_or_else(|| pipe_error("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| pipe_error("stdout"))?;

        info!("Spawned MCP server: {}", program);
        Ok(Self {
            inner: LineTransport::new(BufReader::new(stdout), stdin),
            child: Mutex::new(child),
        })
    }
}

#[async_trait]
impl ClientTransport for StdioClientTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.inner.request(request).await
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        self.inner.notify(notification).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await?;

        let mut child = self.child.lock().await;
        match tokio::time::timeout(CHILD_EXIT_GRACE, child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!("MCP server exited: {}", status);
            }
            Err(_) => {
                warn!("MCP server did not exit after stdin closed, killing it");
                child.kill().await?;
            }
        }
        Ok(())
    }
}

// ==================== SSE transport ====================

/// A single dispatched Server-Sent Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type, `message` unless the server names one
    pub event: String,
    /// Data lines joined with `\n`
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// Parse one event block (the text between blank lines).
    ///
    /// Returns `None` for blocks without data, such as keep-alive comments.
    fn parse(block: &str) -> Option<Self> {
        let mut event = "message".to_string();
        let mut data: Option<String> = None;
        let mut id = None;

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => event = value.to_string(),
                "data" => match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                },
                "id" => id = Some(value.to_string()),
                _ => trace!("Unknown SSE field: {}", field),
            }
        }

        data.map(|data| Self { event, data, id })
    }
}

/// Incremental SSE frame decoder, tolerant of events split across chunks
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a chunk and return every event it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            let text = String::from_utf8_lossy(&block[..pos]);
            if let Some(event) = SseEvent::parse(&text) {
                events.push(event);
            }
        }
        events
    }
}

/// MCP over HTTP + Server-Sent Events
pub struct SseClientTransport {
    http: reqwest::Client,
    endpoint: Url,
    events: Mutex<mpsc::UnboundedReceiver<SseEvent>>,
    reader: JoinHandle<()>,
}

impl SseClientTransport {
    /// Open the event stream at `url` and wait for the message endpoint
    pub async fn connect(url: &str) -> Result<Self> {
        let sse_url = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let http = reqwest::Client::new();
        let response = http
            .get(sse_url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(McpError::TransportError {
                message: format!("SSE connect to {} returned {}", url, status),
            }
            .into());
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_events(response, tx));

        let endpoint = loop {
            match rx.recv().await {
                Some(event) if event.event == "endpoint" => {
                    break sse_url.join(event.data.trim()).map_err(|e| {
                        McpError::ProtocolError {
                            message: format!("invalid endpoint {}: {}", event.data, e),
                        }
                    })?;
                }
                Some(event) => debug!("Ignoring {} event before endpoint", event.event),
                None => {
                    reader.abort();
                    return Err(McpError::ConnectionClosed.into());
                }
            }
        };

        info!("Connected to SSE server, posting to {}", endpoint);
        Ok(Self {
            http,
            endpoint,
            events: Mutex::new(rx),
            reader,
        })
    }

    async fn post<T: Serialize + Sync>(&self, message: &T) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::TransportError {
                message: format!("POST {} returned {}: {}", self.endpoint, status, body),
            }
            .into());
        }
        Ok(())
    }
}

async fn read_events(response: reqwest::Response, tx: mpsc::UnboundedSender<SseEvent>) {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::default();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for event in decoder.push(&bytes) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("SSE stream error: {}", e);
                return;
            }
        }
    }

    debug!("SSE stream ended");
}

#[async_trait]
impl ClientTransport for SseClientTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let mut events = self.events.lock().await;
        self.post(&request).await?;

        loop {
            let event = events.recv().await.ok_or(McpError::ConnectionClosed)?;
            if event.event != "message" {
                continue;
            }

            match decode_incoming(&event.data)? {
                Some(response) if response.id == request.id => return Ok(response),
                Some(response) => {
                    warn!("Dropping response with unexpected id {:?}", response.id)
                }
                None => {}
            }
        }
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        self.post(&notification).await
    }

    async fn close(&self) -> Result<()> {
        self.reader.abort();
        Ok(())
    }
}

impl Drop for SseClientTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
