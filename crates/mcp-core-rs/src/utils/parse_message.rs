use mcp_error_rs::{Error, Result};
use serde_json::Value;

use crate::protocol::{
    constants::{JSONRPC_EXPECTED_VERSION, JSONRPC_VERSION_FIELD},
    message::JsonRpcMessage,
};

/// Parses a JSON-RPC message from a string, validating structure and version.
pub fn parse_json_rpc_message(line: &str) -> Result<JsonRpcMessage> {
    let value: Value = serde_json::from_str(line)?;
    parse_json_rpc_value(value)
}

/// Same as [`parse_json_rpc_message`] for an already decoded value.
pub fn parse_json_rpc_value(value: Value) -> Result<JsonRpcMessage> {
    let Some(obj) = value.as_object() else {
        return Err(Error::InvalidMessage(
            "Message must be a JSON object".into(),
        ));
    };

    match obj.get(JSONRPC_VERSION_FIELD) {
        Some(Value::String(v)) if v == JSONRPC_EXPECTED_VERSION => {}
        _ => {
            return Err(Error::InvalidMessage(
                "Missing or invalid jsonrpc version".into(),
            ));
        }
    }

    let msg = serde_json::from_value(value)?;
    Ok(msg)
}
