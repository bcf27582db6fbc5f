use uuid::Uuid;

use super::{CANVAS_HEIGHT, CANVAS_WIDTH, RenderError};
use crate::tools::validate::ChartRequest;

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";

/// Builds a self-contained Chart.js fragment for `request`.
///
/// Each call gets its own canvas id so several fragments can share a page.
pub(crate) fn render_html(request: &ChartRequest) -> Result<String, RenderError> {
    let id = format!("chart-{}", Uuid::new_v4().simple());
    // `<` only occurs inside JSON strings, where `\u003c` means the same thing and
    // cannot open `</script>` or `<!--` inside the inline script.
    let config = serde_json::to_string(request)?.replace('<', "\\u003c");

    Ok(format!(
        r#"<div style="width: {CANVAS_WIDTH}px; height: {CANVAS_HEIGHT}px;">
  <canvas id="{id}"></canvas>
</div>
<script src="{CHART_JS_CDN}"></script>
<script>
  new Chart(document.getElementById("{id}"), {config});
</script>
"#
    ))
}
