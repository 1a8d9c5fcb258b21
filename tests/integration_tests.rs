//! Integration tests for the current-time MCP server and client
//!
//! These tests drive the real server over both transports: the compiled
//! server binary over stdio, and an in-process SSE server on an ephemeral
//! port.

use std::sync::Arc;

use chrono::DateTime;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use current_time_mcp::config::{ServerConfig, TransportKind};
use current_time_mcp::error::{McpError, TimeMcpError};
use current_time_mcp::mcp::client::McpClient;
use current_time_mcp::mcp::server::McpServer;
use current_time_mcp::mcp::sse;
use current_time_mcp::mcp::types::Implementation;

/// Helper to create a JSON-RPC request
fn make_request(id: i64, method: &str, params: Option<Value>) -> Value {
    let mut request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(p) = params {
        request["params"] = p;
    }
    request
}

fn client_info() -> Implementation {
    Implementation::new("integration-test", "1.0.0")
}

/// Handshake, discover, and invoke with UTC, asserting the result shape
async fn exercise_session(client: &McpClient) {
    let init = client.initialize(client_info()).await.unwrap();
    assert_eq!(init.server_info.name, "current-time");

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "current time");
    assert_eq!(tools[0].input_schema["required"], json!(["timezone"]));

    let result = client
        .call_tool("current time", json!({"timezone": "UTC"}))
        .await
        .unwrap();
    assert_eq!(result.content.len(), 1);
    let text = result.joined_text();
    let stamp = text
        .strip_prefix("current time is ")
        .expect("result should start with the fixed prefix");
    let parsed = DateTime::parse_from_rfc3339(stamp).unwrap();
    assert_eq!(parsed.offset().local_minus_utc(), 0);
}

async fn start_sse_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let server = Arc::new(McpServer::new(&ServerConfig::default()));

    tokio::spawn(sse::serve(server, listener, base_url.clone()));
    base_url
}

mod mcp_protocol_tests {
    use super::*;

    async fn handle(request: Value) -> Value {
        let server = McpServer::new(&ServerConfig::default());
        let response = server.handle_message(&request.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_invocation_wire_shape() {
        let response = handle(make_request(
            3,
            "tools/call",
            Some(json!({
                "name": "current time",
                "arguments": {"timezone": "Europe/London"}
            })),
        ))
        .await;

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 3);
        assert!(response["error"].is_null());
        let content = &response["result"]["content"];
        assert_eq!(content.as_array().unwrap().len(), 1);
        assert_eq!(content[0]["type"], "text");
    }

    #[tokio::test]
    async fn test_failures_are_error_objects() {
        for (arguments, expected) in [
            (json!({"timezone": 123}), "timezone must be a string"),
            (json!({}), "timezone must be a string"),
        ] {
            let response = handle(make_request(
                4,
                "tools/call",
                Some(json!({"name": "current time", "arguments": arguments})),
            ))
            .await;
            assert!(response["result"].is_null());
            assert_eq!(response["error"]["message"], expected);
        }

        let response = handle(make_request(
            5,
            "tools/call",
            Some(json!({
                "name": "current time",
                "arguments": {"timezone": "Nowhere/Imaginary"}
            })),
        ))
        .await;
        assert!(response["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("parse timezone with error: "));
    }
}

mod stdio_tests {
    use super::*;

    #[test]
    fn test_help_names_double_dash_flags() {
        let output = std::process::Command::new(env!("CARGO_BIN_EXE_current-time-server"))
            .arg("--help")
            .output()
            .unwrap();
        assert!(output.status.success());
        let help = String::from_utf8(output.stdout).unwrap();
        assert!(help.contains("single-dash -transport and -server_listen"));
        assert!(help.contains("--server_listen"));
    }

    #[test]
    fn test_single_dash_flag_rejected() {
        let output = std::process::Command::new(env!("CARGO_BIN_EXE_current-time-server"))
            .args(["-transport", "sse"])
            .output()
            .unwrap();
        assert!(!output.status.success());
    }

    #[tokio::test]
    async fn test_stdio_end_to_end() {
        let client =
            McpClient::spawn_stdio(env!("CARGO_BIN_EXE_current-time-server"), &[]).unwrap();

        exercise_session(&client).await;

        // a failed invocation does not take the server down
        let err = client
            .call_tool("current time", json!({"timezone": "Nowhere/Imaginary"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TimeMcpError::Mcp(McpError::Rpc { .. })));
        client.ping().await.unwrap();

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_stdio_explicit_transport_flag() {
        let client = McpClient::spawn_stdio(
            env!("CARGO_BIN_EXE_current-time-server"),
            &["--transport".to_string(), "stdio".to_string()],
        )
        .unwrap();

        exercise_session(&client).await;
        client.close().await.unwrap();
    }
}

mod sse_tests {
    use super::*;

    #[tokio::test]
    async fn test_sse_end_to_end() {
        let base_url = start_sse_server().await;
        let client = McpClient::connect_sse(&format!("{}/sse", base_url))
            .await
            .unwrap();

        exercise_session(&client).await;
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sse_concurrent_sessions() {
        let base_url = start_sse_server().await;
        let url = format!("{}/sse", base_url);

        let first = McpClient::connect_sse(&url).await.unwrap();
        let second = McpClient::connect_sse(&url).await.unwrap();

        tokio::join!(exercise_session(&first), exercise_session(&second));
    }

    #[tokio::test]
    async fn test_sse_discovery_before_handshake_is_rejected() {
        let base_url = start_sse_server().await;
        let client = McpClient::connect_sse(&format!("{}/sse", base_url))
            .await
            .unwrap();

        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, TimeMcpError::Mcp(McpError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = occupied.local_addr().unwrap().to_string();

        let config = ServerConfig::new(TransportKind::Sse, addr).unwrap();
        let server = McpServer::new(&config);
        let err = server.run(config).await.unwrap_err();
        assert!(matches!(err, TimeMcpError::Mcp(McpError::Bind { .. })));
    }
}
