use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    core::{Tool, content::Content, protocol::capabilities::ServerCapabilities},
    error::{Error, Result},
    server::router::{capabilities::CapabilitiesBuilder, traits::Router},
    tools::{
        render::{ChartRenderer, OutputFormat, PngOutput, RenderResult},
        validate::{ChartKind, validate},
    },
};

pub const TOOL_NAME: &str = "generateChart";

const TROUBLESHOOTING: &str = "\n\nTroubleshooting:\n\
- type must be one of: bar, line, scatter, bubble, pie, doughnut, polarArea, radar\n\
- data.datasets must be a non-empty array and every dataset needs a data array\n\
- bar, line, radar, pie, doughnut and polarArea data are plain numbers (null leaves a gap)\n\
- scatter data are {\"x\": number, \"y\": number} points; bubble points also need \"r\"\n\
- pie, doughnut and polarArea values cannot be negative";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateChartArgs {
    pub chart_config: Value,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub save_to_file: bool,
}

/// Serves the `generateChart` tool. Holds no per-call state.
#[derive(Clone)]
pub struct ChartRouter {
    renderer: Arc<ChartRenderer>,
}

impl ChartRouter {
    pub fn new(renderer: Arc<ChartRenderer>) -> Self {
        Self { renderer }
    }

    /// Validates, renders and shapes the outcome into content blocks.
    ///
    /// Invalid configurations and rendering failures are reported as an
    /// `Error: ...` text block rather than a protocol error.
    pub async fn generate_chart(&self, args: GenerateChartArgs) -> Vec<Content> {
        let request = match validate(args.chart_config) {
            Ok(request) => request,
            Err(e) => {
                tracing::info!(error = %e, "Rejected chart configuration");
                return vec![Content::text(format!("Error: {e}"))];
            }
        };

        let result = self
            .renderer
            .render(&request, args.output_format, args.save_to_file)
            .await;

        let content = match result {
            RenderResult::Html(markup) => Content::text_with_mime(markup, "text/html"),
            RenderResult::Png(PngOutput::Bytes(bytes)) => {
                Content::image(STANDARD.encode(bytes), "image/png")
            }
            RenderResult::Png(PngOutput::File(path)) => Content::text(path.display().to_string()),
            RenderResult::Failure(message) => {
                Content::text(format!("Error: {message}{TROUBLESHOOTING}"))
            }
        };
        vec![content]
    }
}

#[async_trait]
impl Router for ChartRouter {
    fn name(&self) -> String {
        "chart-mcp".into()
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn instructions(&self) -> String {
        format!(
            "Call {TOOL_NAME} with a Chart.js style configuration ({{type, data, options}}). \
             Supported types: {}. The result is a PNG image by default, embeddable HTML when \
             outputFormat is \"html\", or a file path when saveToFile is true.",
            ChartKind::valid_names()
        )
    }

    fn capabilities(&self) -> ServerCapabilities {
        CapabilitiesBuilder::new().with_tools(false).build()
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![Tool::new(
            TOOL_NAME,
            "Render a chart (bar, line, scatter, bubble, pie, doughnut, polarArea, radar) \
             from a Chart.js style configuration",
            json!({
                "type": "object",
                "properties": {
                    "chartConfig": {
                        "oneOf": [{ "type": "object" }, { "type": "string" }],
                        "description": "Chart configuration object, or the same object as JSON text"
                    },
                    "outputFormat": {
                        "type": "string",
                        "enum": ["png", "html"],
                        "default": "png"
                    },
                    "saveToFile": {
                        "type": "boolean",
                        "default": false,
                        "description": "Write the PNG to the output directory and return its path"
                    }
                },
                "required": ["chartConfig"]
            }),
        )]
    }

    async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<Vec<Content>> {
        match tool_name {
            TOOL_NAME => {
                let args: GenerateChartArgs = serde_json::from_value(arguments).map_err(|e| {
                    Error::InvalidParameters(format!("Invalid {TOOL_NAME} arguments: {e}"))
                })?;
                Ok(self.generate_chart(args).await)
            }
            _ => Err(Error::ToolNotFound(tool_name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn router(dir: &std::path::Path) -> ChartRouter {
        ChartRouter::new(Arc::new(ChartRenderer::new(dir)))
    }

    async fn call(router: &ChartRouter, args: Value) -> Vec<Content> {
        router.call_tool(TOOL_NAME, args).await.unwrap()
    }

    fn sales() -> Value {
        json!({
            "type": "bar",
            "data": {
                "labels": ["Q1", "Q2", "Q3"],
                "datasets": [{"label": "Sales", "data": [50, 75, 60]}]
            }
        })
    }

    fn only_text(content: &[Content]) -> &str {
        assert_eq!(content.len(), 1);
        content[0].as_text().unwrap()
    }

    #[tokio::test]
    async fn png_is_single_image_block() {
        let dir = tempfile::tempdir().unwrap();
        let content = call(&router(dir.path()), json!({"chartConfig": sales()})).await;

        assert_eq!(content.len(), 1);
        let (data, mime) = content[0].as_image().unwrap();
        assert_eq!(mime, "image/png");
        let bytes = STANDARD.decode(data).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (800, 600));
    }

    #[tokio::test]
    async fn html_is_single_html_text_block() {
        let dir = tempfile::tempdir().unwrap();
        let content = call(
            &router(dir.path()),
            json!({"chartConfig": sales(), "outputFormat": "html"}),
        )
        .await;

        assert_eq!(content[0].mime_type(), Some("text/html"));
        assert!(only_text(&content).contains("<canvas"));
    }

    #[tokio::test]
    async fn saved_png_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let content = call(
            &router(dir.path()),
            json!({"chartConfig": sales(), "saveToFile": true}),
        )
        .await;

        let path = std::path::PathBuf::from(only_text(&content));
        assert!(path.starts_with(dir.path()));
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (800, 600));
    }

    #[tokio::test]
    async fn accepts_config_as_json_text() {
        let dir = tempfile::tempdir().unwrap();
        let content = call(
            &router(dir.path()),
            json!({"chartConfig": sales().to_string()}),
        )
        .await;
        assert!(content[0].as_image().is_some());
    }

    #[tokio::test]
    async fn invalid_configs_report_ordered_messages() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path());
        let cases = [
            (
                json!({"type": "bar", "data": {"labels": ["A"]}}),
                "Error: Chart data must include a datasets array",
            ),
            (
                json!({"type": "bar", "data": {"datasets": []}}),
                "Error: Chart data must include at least one dataset",
            ),
            (
                json!({"type": "histogram", "data": {"datasets": [{"data": [1]}]}}),
                "Error: Invalid chart type. Must be one of: bar, line, scatter, bubble, pie, \
                 doughnut, polarArea, radar",
            ),
            (
                json!({"type": "pie"}),
                "Error: Chart configuration must include a data object",
            ),
            (json!([1, 2]), "Error: Chart configuration must be an object"),
        ];

        for (config, expected) in cases {
            let content = call(&router, json!({"chartConfig": config})).await;
            assert_eq!(only_text(&content), expected);
        }
    }

    #[tokio::test]
    async fn render_failure_carries_troubleshooting() {
        let dir = tempfile::tempdir().unwrap();
        let content = call(
            &router(dir.path()),
            json!({"chartConfig": {"type": "scatter", "data": {"datasets": [{"data": [1, 2]}]}}}),
        )
        .await;

        let text = only_text(&content);
        assert!(text.starts_with("Error: "));
        assert!(text.contains("x and y"));
        assert!(text.ends_with(TROUBLESHOOTING));
    }

    #[tokio::test]
    async fn repeated_calls_have_same_shape() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path());

        for (format, mime) in [("html", "text/html"), ("png", "image/png")] {
            let args = json!({"chartConfig": sales(), "outputFormat": format});
            let first = call(&router, args.clone()).await;
            let second = call(&router, args).await;

            assert_eq!(first.len(), 1, "{format}");
            assert_eq!(second.len(), 1, "{format}");
            assert_eq!(first[0].mime_type(), Some(mime));
            assert_eq!(second[0].mime_type(), Some(mime));
            assert_eq!(first[0].as_image().is_some(), second[0].as_image().is_some());
        }

        // Rendering is deterministic, so the PNG bytes match too.
        let args = json!({"chartConfig": sales()});
        let first = call(&router, args.clone()).await;
        let second = call(&router, args).await;
        assert_eq!(first[0].as_image(), second[0].as_image());
    }

    #[tokio::test]
    async fn malformed_arguments_are_protocol_errors() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path());

        let err = router.call_tool(TOOL_NAME, json!({})).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));

        let err = router
            .call_tool(TOOL_NAME, json!({"chartConfig": sales(), "outputFormat": "svg"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));

        let err = router.call_tool("drawChart", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(name) if name == "drawChart"));
    }

    #[test]
    fn lists_single_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tools = router(dir.path()).list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, TOOL_NAME);
        assert_eq!(tools[0].input_schema["required"], json!(["chartConfig"]));
    }
}
