//! The `generateChart` MCP tool.
//!
//! [`tools::validate`] checks the caller's chart description,
//! [`tools::render::ChartRenderer`] turns it into a PNG or an embeddable HTML
//! fragment, and [`service::chart::ChartRouter`] exposes both as an MCP
//! router that always answers with content blocks.

pub mod service;
pub mod tools;

pub use mcp_core_rs as core;
pub use mcp_error_rs as error;
pub use mcp_server_rs as server;
pub use service::chart::ChartRouter;
pub use tools::render::{ChartRenderer, OutputFormat, PngOutput, RenderResult};
pub use tools::validate::{ChartKind, ChartRequest, InvalidConfig, validate};
