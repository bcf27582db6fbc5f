//! Drives a full MCP exchange over newline-delimited bytes, the way a stdio
//! client talks to the server.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use mcp_chart_rs::{
    ChartRenderer, ChartRouter,
    server::{router::service::RouterService, server::Server, transport::ByteTransport},
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, duplex};

struct Client {
    writer: DuplexStream,
    lines: Lines<BufReader<DuplexStream>>,
}

impl Client {
    async fn send(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn call(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        let response = self.recv().await;
        assert_eq!(response["id"], id);
        response
    }
}

fn start(dir: &std::path::Path) -> (Client, tokio::task::JoinHandle<()>) {
    let (client_write, server_read) = duplex(1 << 20);
    let (server_write, client_read) = duplex(1 << 20);

    let router = ChartRouter::new(Arc::new(ChartRenderer::new(dir)));
    let server = Server::new(RouterService::new(router));
    let task = tokio::spawn(async move {
        server
            .run(ByteTransport::new(server_read, server_write))
            .await
            .unwrap();
    });

    let client = Client {
        writer: client_write,
        lines: BufReader::new(client_read).lines(),
    };
    (client, task)
}

#[tokio::test]
async fn initialize_list_and_call() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, task) = start(dir.path());

    let init = client
        .call(
            1,
            "initialize",
            json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0.0"}
            }),
        )
        .await;
    assert_eq!(init["result"]["serverInfo"]["name"], "chart-mcp");
    assert!(init["result"]["capabilities"]["tools"].is_object());

    client
        .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;

    let tools = client.call(2, "tools/list", json!({})).await;
    assert_eq!(tools["result"]["tools"][0]["name"], "generateChart");

    let chart = client
        .call(
            3,
            "tools/call",
            json!({
                "name": "generateChart",
                "arguments": {
                    "chartConfig": {
                        "type": "radar",
                        "data": {
                            "labels": ["speed", "range", "cost"],
                            "datasets": [{"label": "A", "data": [3, 5, 2]}]
                        }
                    }
                }
            }),
        )
        .await;
    let content = chart["result"]["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["type"], "image");
    assert_eq!(content[0]["mimeType"], "image/png");
    let png = STANDARD.decode(content[0]["data"].as_str().unwrap()).unwrap();
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (800, 600));

    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn tool_level_and_protocol_level_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, _task) = start(dir.path());

    let invalid = client
        .call(
            1,
            "tools/call",
            json!({
                "name": "generateChart",
                "arguments": {"chartConfig": {"type": "bar", "data": {"datasets": []}}}
            }),
        )
        .await;
    assert_eq!(
        invalid["result"]["content"][0]["text"],
        "Error: Chart data must include at least one dataset"
    );

    let unknown_tool = client
        .call(2, "tools/call", json!({"name": "plot", "arguments": {}}))
        .await;
    assert_eq!(unknown_tool["error"]["code"], -32602);

    let unknown_method = client.call(3, "resources/list", json!({})).await;
    assert_eq!(unknown_method["error"]["code"], -32601);

    let pong = client.call(4, "ping", json!({})).await;
    assert_eq!(pong["result"], json!({}));
}
