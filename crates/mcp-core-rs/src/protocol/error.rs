use mcp_error_rs::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR};

/// Error information for JSON-RPC error responses.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorData {
    /// The error type that occurred.
    pub code: i32,

    /// A short description of the error. The message SHOULD be limited to a concise single
    /// sentence.
    pub message: String,

    /// Additional information about the error. The value of this member is defined by the
    /// sender (e.g. detailed error information, nested errors etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&Error> for ErrorData {
    fn from(e: &Error) -> Self {
        let code = match e {
            Error::Json(_) | Error::InvalidMessage(_) | Error::Utf8(_) => PARSE_ERROR,
            Error::MethodNotFound(_) => METHOD_NOT_FOUND,
            Error::InvalidParameters(_) | Error::ToolNotFound(_) => INVALID_PARAMS,
            _ => INTERNAL_ERROR,
        };
        Self::new(code, e.to_string())
    }
}
