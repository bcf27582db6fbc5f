use crate::core::protocol::capabilities::{ServerCapabilities, ToolsCapability};

/// Builder for configuring and constructing capabilities
pub struct CapabilitiesBuilder {
    tools: Option<ToolsCapability>,
}

impl Default for CapabilitiesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilitiesBuilder {
    pub fn new() -> Self {
        Self { tools: None }
    }

    /// Enable the tools capability
    pub fn with_tools(mut self, list_changed: bool) -> Self {
        self.tools = Some(ToolsCapability {
            list_changed: Some(list_changed),
        });
        self
    }

    pub fn build(self) -> ServerCapabilities {
        ServerCapabilities { tools: self.tools }
    }
}
