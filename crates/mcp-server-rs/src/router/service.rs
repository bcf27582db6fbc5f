use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower_service::Service;

use crate::{
    core::protocol::{
        error::ErrorData,
        message::{JsonRpcRequest, JsonRpcResponse},
    },
    error::{BoxError, Error},
    router::traits::Router,
};

/// Adapts a [`Router`] into a tower `Service` over JSON-RPC requests.
///
/// Router errors are folded into the response's `error` member, so the
/// service itself only fails on internal faults.
pub struct RouterService<T>(pub Arc<T>);

impl<T> Clone for RouterService<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Router> RouterService<T> {
    pub fn new(router: T) -> Self {
        Self(Arc::new(router))
    }
}

impl<T> Service<JsonRpcRequest> for RouterService<T>
where
    T: Router + 'static,
{
    type Response = JsonRpcResponse;
    type Error = BoxError;
    type Future =
        Pin<Box<dyn Future<Output = core::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<core::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: JsonRpcRequest) -> Self::Future {
        let this = self.0.clone();

        Box::pin(async move {
            let id = req.id.clone();
            let result = match req.method.as_str() {
                "initialize" => this.handle_initialize(req).await,
                "ping" => this.handle_ping(req).await,
                "tools/list" => this.handle_tools_list(req).await,
                "tools/call" => this.handle_tools_call(req).await,
                _ => Err(Error::MethodNotFound(req.method)),
            };

            Ok(result.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Request failed");
                JsonRpcResponse::with_error(id, ErrorData::from(&e))
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        core::{
            Tool,
            content::Content,
            protocol::{
                capabilities::ServerCapabilities,
                constants::{INVALID_PARAMS, METHOD_NOT_FOUND},
                message::RequestId,
            },
        },
        error::Result,
        router::capabilities::CapabilitiesBuilder,
    };

    struct EchoRouter;

    #[async_trait]
    impl Router for EchoRouter {
        fn name(&self) -> String {
            "echo".into()
        }

        fn version(&self) -> String {
            "0.0.1".into()
        }

        fn instructions(&self) -> String {
            "echoes".into()
        }

        fn capabilities(&self) -> ServerCapabilities {
            CapabilitiesBuilder::new().with_tools(false).build()
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![Tool::new("echo", "Echo the input", json!({"type": "object"}))]
        }

        async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<Vec<Content>> {
            match tool_name {
                "echo" => Ok(vec![Content::text(arguments.to_string())]),
                _ => Err(Error::ToolNotFound(tool_name.to_string())),
            }
        }
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: Some(RequestId::Number(1)),
            method: method.into(),
            params,
        }
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let mut service = RouterService::new(EchoRouter);
        let response = service.call(request("initialize", None)).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "echo");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["instructions"], "echoes");
    }

    #[tokio::test]
    async fn tools_call_wraps_content() {
        let mut service = RouterService::new(EchoRouter);
        let params = json!({"name": "echo", "arguments": {"a": 1}});
        let response = service
            .call(request("tools/call", Some(params)))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let mut service = RouterService::new(EchoRouter);
        let params = json!({"name": "nope"});
        let response = service
            .call(request("tools/call", Some(params)))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_is_reported() {
        let mut service = RouterService::new(EchoRouter);
        let response = service.call(request("resources/list", None)).await.unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let mut service = RouterService::new(EchoRouter);
        let response = service.call(request("ping", None)).await.unwrap();
        assert_eq!(response.result, Some(json!({})));
    }
}
