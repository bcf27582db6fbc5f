use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use futures::StreamExt;
use mcp_server_rs::core::{
    protocol::{
        constants::{INTERNAL_ERROR, PARSE_ERROR, SERVER_ERROR},
        message::JsonRpcMessage,
    },
    utils::parse_json_rpc_message,
};
use serde_json::json;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::session::{SessionId, SessionRegistry};

pub const SESSION_HEADER: &str = "mcp-session-id";

const NO_SESSION: &str = "Bad Request: No valid session ID provided";

pub fn router(registry: SessionRegistry) -> Router {
    Router::new()
        .route("/mcp", post(post_mcp).get(get_mcp).delete(delete_mcp))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(registry)
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

fn jsonrpc_error(status: StatusCode, code: i32, message: &str) -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": null,
    });
    (status, Json(body)).into_response()
}

fn no_session() -> Response {
    jsonrpc_error(StatusCode::BAD_REQUEST, SERVER_ERROR, NO_SESSION)
}

async fn post_mcp(
    State(registry): State<SessionRegistry>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message = match std::str::from_utf8(&body)
        .map_err(|e| e.to_string())
        .and_then(|text| parse_json_rpc_message(text).map_err(|e| e.to_string()))
    {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected POST body");
            return jsonrpc_error(
                StatusCode::BAD_REQUEST,
                PARSE_ERROR,
                &format!("Parse error: {e}"),
            );
        }
    };

    let (session, handle) = match session_header(&headers) {
        Some(session) => match registry.get(session).await {
            Some(handle) => (SessionId::from(session), handle),
            None => {
                tracing::debug!(%session, "Unknown session");
                return no_session();
            }
        },
        None if message.is_initialize_request() => match registry.create().await {
            Some(created) => created,
            None => {
                return jsonrpc_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    SERVER_ERROR,
                    "Server is shutting down",
                );
            }
        },
        None => return no_session(),
    };
    let id_header = [(SESSION_HEADER, session.to_string())];

    if !message.is_request() {
        if let Err(e) = handle.notify(message) {
            tracing::warn!(%session, error = %e, "Session is gone");
            return no_session();
        }
        return (StatusCode::ACCEPTED, id_header).into_response();
    }

    match handle.request(message).await {
        Ok(reply) => (StatusCode::OK, id_header, Json(reply)).into_response(),
        Err(e) => {
            tracing::error!(%session, error = %e, "Session dropped the request");
            jsonrpc_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
                &e.to_string(),
            )
        }
    }
}

/// Server-sent event stream for messages the session sends on its own.
async fn get_mcp(State(registry): State<SessionRegistry>, headers: HeaderMap) -> Response {
    let Some(session) = session_header(&headers) else {
        return no_session();
    };
    let Some(handle) = registry.get(session).await else {
        return no_session();
    };

    tracing::debug!(%session, "Opening event stream");
    let stream = UnboundedReceiverStream::new(handle.open_stream())
        .map(|msg: JsonRpcMessage| Event::default().event("message").json_data(msg));

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn delete_mcp(State(registry): State<SessionRegistry>, headers: HeaderMap) -> Response {
    match session_header(&headers) {
        Some(session) if registry.close(session).await => StatusCode::OK.into_response(),
        _ => no_session(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "server": "chart-mcp",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
