use async_trait::async_trait;
use serde_json::Value;

use crate::{
    core::{
        Tool, ToolCall,
        content::Content,
        protocol::{
            capabilities::ServerCapabilities,
            constants::LATEST_PROTOCOL_VERSION,
            message::{JsonRpcRequest, JsonRpcResponse, RequestId},
            result::{CallToolResult, EmptyResult, Implementation, InitializeResult, ListToolsResult},
        },
    },
    error::{Error, Result},
};

/// A tool-serving MCP endpoint.
///
/// Implementors describe themselves and their tools; the `handle_*` methods
/// turn protocol requests into responses and are rarely overridden.
#[async_trait]
pub trait Router: Send + Sync {
    fn name(&self) -> String;

    fn version(&self) -> String;

    fn instructions(&self) -> String;

    fn capabilities(&self) -> ServerCapabilities;

    fn list_tools(&self) -> Vec<Tool>;

    async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<Vec<Content>>;

    fn create_response(&self, id: Option<RequestId>) -> JsonRpcResponse {
        JsonRpcResponse::new_empty(id)
    }

    async fn handle_initialize(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: self.capabilities(),
            server_info: Implementation {
                name: self.name(),
                version: self.version(),
            },
            instructions: Some(self.instructions()),
        };
        let mut response = self.create_response(req.id);
        response.result = Some(serde_json::to_value(result)?);
        Ok(response)
    }

    async fn handle_ping(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let mut response = self.create_response(req.id);
        response.result = Some(serde_json::to_value(EmptyResult {})?);
        Ok(response)
    }

    async fn handle_tools_list(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let result = ListToolsResult {
            tools: self.list_tools(),
            next_cursor: None,
        };
        let mut response = self.create_response(req.id);
        response.result = Some(serde_json::to_value(result)?);
        Ok(response)
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let params = req
            .params
            .ok_or_else(|| Error::InvalidParameters("Missing tools/call params".into()))?;
        let call: ToolCall = serde_json::from_value(params)
            .map_err(|e| Error::InvalidParameters(format!("Invalid tools/call params: {e}")))?;

        tracing::debug!(tool = %call.name, "Calling tool");
        let content = self.call_tool(&call.name, call.arguments).await?;

        let result = CallToolResult {
            content,
            is_error: None,
        };
        let mut response = self.create_response(req.id);
        response.result = Some(serde_json::to_value(result)?);
        Ok(response)
    }
}
