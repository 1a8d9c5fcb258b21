//! HTTP + Server-Sent Events transport for the MCP server
//!
//! A client opens `GET /sse` and receives an `endpoint` event naming the URL
//! to POST its JSON-RPC messages to. Responses are delivered back on the
//! event stream as `message` events.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{McpError, Result};
use crate::mcp::server::McpServer;
use crate::mcp::types::JsonRpcResponse;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGE_PATH: &str = "/message";

type Sessions = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<JsonRpcResponse>>>>;

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    sessions: Sessions,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Bind the configured address and serve until the listener fails
pub async fn run(server: Arc<McpServer>, config: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|source| McpError::Bind {
            addr: config.listen.clone(),
            source,
        })?;

    info!("SSE server listening on {}", config.listen);
    serve(server, listener, config.base_url()).await
}

/// Serve the SSE transport on an already bound listener
pub async fn serve(server: Arc<McpServer>, listener: TcpListener, base_url: String) -> Result<()> {
    axum::serve(listener, router(server, base_url)).await?;
    Ok(())
}

/// Routes for the SSE transport
pub fn router(server: Arc<McpServer>, base_url: String) -> Router {
    routes(SseState {
        server,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        base_url: base_url.trim_end_matches('/').to_string(),
    })
}

fn routes(state: SseState) -> Router {
    Router::new()
        .route(SSE_PATH, get(sse_handler))
        .route(MESSAGE_PATH, post(message_handler))
        .with_state(state)
}

async fn sse_handler(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::unbounded_channel();

    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), tx.clone());
    info!(session = %session_id, "SSE session opened");

    // The receiver lives inside the response stream, so `closed` fires once
    // the client disconnects and the stream is dropped.
    let sessions = state.sessions.clone();
    let closed_id = session_id.clone();
    tokio::spawn(async move {
        tx.closed().await;
        sessions.write().await.remove(&closed_id);
        info!(session = %closed_id, "SSE session closed");
    });

    let endpoint = format!(
        "{}{}?sessionId={}",
        state.base_url, MESSAGE_PATH, session_id
    );
    let first = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let messages = UnboundedReceiverStream::new(rx).filter_map(|response| async move {
        match serde_json::to_string(&response) {
            Ok(data) => Some(Ok::<_, Infallible>(
                Event::default().event("message").data(data),
            )),
            Err(e) => {
                warn!("Failed to encode response: {}", e);
                None
            }
        }
    });

    Sse::new(first.chain(messages)).keep_alive(KeepAlive::default())
}

async fn message_handler(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> impl IntoResponse {
    let sender = state.sessions.read().await.get(&query.session_id).cloned();
    let Some(sender) = sender else {
        debug!(session = %query.session_id, "Message for unknown session");
        return (StatusCode::BAD_REQUEST, "Invalid session ID");
    };

    if let Some(response) = state.server.handle_message(&body).await {
        if sender.send(response).is_err() {
            return (StatusCode::GONE, "Session stream closed");
        }
    }

    (StatusCode::ACCEPTED, "Accepted")
}
