use tower_service::Service;

use crate::{
    core::protocol::{
        error::ErrorData,
        message::{JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse},
    },
    error::{BoxError, Error, Result},
    transport::traits::ServerTransport,
};

/// Drives one transport: reads messages, answers requests in arrival order.
pub struct Server<S> {
    service: S,
}

impl<S> Server<S>
where
    S: Service<JsonRpcRequest, Response = JsonRpcResponse> + Send,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn run(self, mut transport: impl ServerTransport) -> Result<()> {
        let mut service = self.service;

        tracing::info!("Server started");
        while let Some(msg_result) = transport.read_message().await {
            match msg_result {
                Ok(msg) => {
                    Self::handle_message(&mut service, &mut transport, msg).await?;
                }
                Err(e) => {
                    Self::handle_error(&mut transport, e).await?;
                }
            }
        }
        tracing::info!("Server transport closed, exiting run loop");

        transport.close().await
    }

    async fn handle_message(
        service: &mut S,
        transport: &mut impl ServerTransport,
        msg: JsonRpcMessage,
    ) -> Result<()> {
        match msg {
            JsonRpcMessage::Request(request) => {
                let response = Self::process_request(service, request).await;
                Self::send_response(transport, response).await?;
            }
            JsonRpcMessage::Notification(notification) => {
                tracing::debug!(method = %notification.method, "Received notification");
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Nil | JsonRpcMessage::Error(_) => {
                tracing::debug!("Ignoring client response message");
            }
        }
        Ok(())
    }

    async fn process_request(service: &mut S, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        tracing::debug!(
            request_id = ?id,
            method = %request.method,
            "Received request"
        );

        match service.call(request).await {
            Ok(resp) => resp,
            Err(e) => {
                let error: BoxError = e.into();
                let error_msg = error.to_string();
                tracing::error!(error = %error_msg, "Request processing failed");
                JsonRpcResponse::with_error(id, ErrorData::from(&Error::System(error_msg)))
            }
        }
    }

    async fn send_response(
        transport: &mut impl ServerTransport,
        response: JsonRpcResponse,
    ) -> Result<()> {
        tracing::debug!(
            response_id = ?response.id,
            is_error = response.error.is_some(),
            "Sending response"
        );

        transport
            .write_message(JsonRpcMessage::Response(response))
            .await
    }

    async fn handle_error(transport: &mut impl ServerTransport, e: Error) -> Result<()> {
        tracing::warn!(error = %e, "Failed to read message");
        let error_response = JsonRpcMessage::Error(JsonRpcError::new(None, ErrorData::from(&e)));
        transport.write_message(error_response).await
    }
}
