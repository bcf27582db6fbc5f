use async_trait::async_trait;
use mcp_core_rs::{protocol::message::JsonRpcMessage, utils::parse_json_rpc_message};
use mcp_error_rs::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::server::traits::ServerTransport;

/// A transport that reads and writes newline-delimited JSON-RPC messages over byte streams.
///
/// Used with stdin/stdout for the stdio mode; any `AsyncRead`/`AsyncWrite` pair works,
/// which is how the tests drive it through `tokio::io::duplex`.
pub struct ByteTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    buf: Vec<u8>,
}

impl<R, W> ByteTransport<R, W>
where
    R: AsyncRead,
    W: AsyncWrite,
{
    /// Creates a new `ByteTransport` with the given reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::with_capacity(2 * 1024 * 1024, reader),
            writer,
            buf: Vec::with_capacity(64 * 1024),
        }
    }
}

#[async_trait]
impl<R, W> ServerTransport for ByteTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_message(&mut self) -> Option<Result<JsonRpcMessage>> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => {
                    tracing::info!("Client closed connection (read 0 bytes)");
                    return None;
                }
                Ok(_) => {
                    let line = match String::from_utf8(std::mem::take(&mut self.buf)) {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!(?e, "Invalid UTF-8 line");
                            return Some(Err(Error::Utf8(e)));
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(parse_json_rpc_message(&line));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }

    async fn write_message(&mut self, msg: JsonRpcMessage) -> Result<()> {
        let json = serde_json::to_string(&msg)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mcp_core_rs::protocol::message::{JsonRpcResponse, RequestId};
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    use super::*;

    #[tokio::test]
    async fn reads_messages_and_skips_blank_lines() {
        let (mut client, server_read) = duplex(1024);
        let (server_write, _client_read) = duplex(1024);
        let mut transport = ByteTransport::new(server_read, server_write);

        client
            .write_all(b"\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n")
            .await
            .unwrap();
        drop(client);

        let msg = transport.read_message().await.unwrap().unwrap();
        assert_eq!(msg.id(), Some(&RequestId::Number(7)));
        assert!(transport.read_message().await.is_none());
    }

    #[tokio::test]
    async fn reports_parse_errors_without_closing() {
        let (mut client, server_read) = duplex(1024);
        let (server_write, _client_read) = duplex(1024);
        let mut transport = ByteTransport::new(server_read, server_write);

        client
            .write_all(b"garbage\n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n")
            .await
            .unwrap();

        assert!(transport.read_message().await.unwrap().is_err());
        let msg = transport.read_message().await.unwrap().unwrap();
        assert!(matches!(msg, JsonRpcMessage::Notification(_)));
    }

    #[tokio::test]
    async fn writes_one_line_per_message() {
        let (_client, server_read) = duplex(1024);
        let (server_write, client_read) = duplex(4096);
        let mut transport = ByteTransport::new(server_read, server_write);

        let response =
            JsonRpcResponse::success(Some(RequestId::Number(1)), json!({"nested": {"a": 1}}));
        transport
            .write_message(JsonRpcMessage::Response(response))
            .await
            .unwrap();

        let mut lines = BufReader::new(client_read).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["result"]["nested"]["a"], json!(1));
    }
}
