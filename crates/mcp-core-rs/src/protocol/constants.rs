pub const JSONRPC_VERSION_FIELD: &str = "jsonrpc";
pub const JSONRPC_EXPECTED_VERSION: &str = "2.0";

/// Protocol revision that introduced the streamable HTTP transport.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Implementation-defined server error, used for transport/session violations.
pub const SERVER_ERROR: i32 = -32000;
