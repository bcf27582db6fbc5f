pub mod parse_message;

pub use parse_message::{parse_json_rpc_message, parse_json_rpc_value};
