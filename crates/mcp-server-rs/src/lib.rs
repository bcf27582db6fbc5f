pub mod router;
pub mod server;

pub use mcp_core_rs as core;
pub use mcp_error_rs as error;
pub use mcp_transport_rs::server as transport;
