use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Bubble,
    Pie,
    Doughnut,
    PolarArea,
    Radar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Bubble,
        ChartKind::Pie,
        ChartKind::Doughnut,
        ChartKind::PolarArea,
        ChartKind::Radar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Bubble => "bubble",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::PolarArea => "polarArea",
            ChartKind::Radar => "radar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Comma separated list of every accepted type name.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(ChartKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural problems with a chart configuration, in evaluation order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidConfig {
    #[error("Chart configuration is not valid JSON: {0}")]
    NotJson(String),

    #[error("Chart configuration must be an object")]
    NotAnObject,

    #[error("Invalid chart type. Must be one of: {}", ChartKind::valid_names())]
    InvalidType,

    #[error("Chart configuration must include a data object")]
    MissingData,

    #[error("Chart data must include a datasets array")]
    MissingDatasets,

    #[error("Chart data must include at least one dataset")]
    EmptyDatasets,
}

/// A structurally valid chart description.
///
/// Serializes back into the `{type, data, options}` shape, which is what the
/// HTML renderer hands to Chart.js.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl ChartRequest {
    /// Never empty once validated.
    pub fn datasets(&self) -> &[Value] {
        self.data
            .get("datasets")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn labels(&self) -> Vec<String> {
        let Some(labels) = self.data.get("labels").and_then(Value::as_array) else {
            return Vec::new();
        };
        labels
            .iter()
            .map(|label| match label {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// Checks a chart description supplied either as an object or as JSON text.
///
/// Only the outer shape is checked; whether each dataset fits its chart type
/// is left to the renderer.
pub fn validate(input: Value) -> Result<ChartRequest, InvalidConfig> {
    let value = match input {
        Value::String(text) => {
            serde_json::from_str(&text).map_err(|e| InvalidConfig::NotJson(e.to_string()))?
        }
        other => other,
    };

    let Value::Object(mut config) = value else {
        return Err(InvalidConfig::NotAnObject);
    };

    let kind = config
        .get("type")
        .and_then(Value::as_str)
        .and_then(ChartKind::from_name)
        .ok_or(InvalidConfig::InvalidType)?;

    let Some(Value::Object(data)) = config.remove("data") else {
        return Err(InvalidConfig::MissingData);
    };

    match data.get("datasets") {
        Some(Value::Array(datasets)) if datasets.is_empty() => {
            return Err(InvalidConfig::EmptyDatasets);
        }
        Some(Value::Array(_)) => {}
        _ => return Err(InvalidConfig::MissingDatasets),
    }

    Ok(ChartRequest {
        kind,
        data,
        options: config.remove("options"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_minimal_bar_chart() {
        let request = validate(json!({
            "type": "bar",
            "data": {"labels": ["Q1", "Q2"], "datasets": [{"label": "Sales", "data": [50, 75]}]}
        }))
        .unwrap();

        assert_eq!(request.kind, ChartKind::Bar);
        assert_eq!(request.datasets().len(), 1);
        assert_eq!(request.labels(), vec!["Q1", "Q2"]);
        assert!(request.options.is_none());
    }

    #[test]
    fn accepts_json_text() {
        let text = r#"{"type": "polarArea", "data": {"datasets": [{"data": [1, 2]}]}, "options": {"a": 1}}"#;
        let request = validate(Value::String(text.to_string())).unwrap();
        assert_eq!(request.kind, ChartKind::PolarArea);
        assert_eq!(request.options, Some(json!({"a": 1})));
    }

    #[test]
    fn rejects_unparsable_text() {
        let err = validate(Value::String("{type: bar".into())).unwrap_err();
        assert!(matches!(err, InvalidConfig::NotJson(_)));
        assert!(err.to_string().starts_with("Chart configuration is not valid JSON"));
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(validate(json!([1, 2])), Err(InvalidConfig::NotAnObject));
        assert_eq!(
            validate(Value::String("42".into())),
            Err(InvalidConfig::NotAnObject)
        );
        assert_eq!(validate(Value::Null), Err(InvalidConfig::NotAnObject));
    }

    #[test]
    fn rejects_unknown_or_missing_type() {
        let err = validate(json!({"type": "flowchart", "data": {"datasets": [{"data": [1]}]}}))
            .unwrap_err();
        assert_eq!(err, InvalidConfig::InvalidType);
        assert_eq!(
            err.to_string(),
            "Invalid chart type. Must be one of: bar, line, scatter, bubble, pie, doughnut, \
             polarArea, radar"
        );

        assert_eq!(
            validate(json!({"data": {"datasets": [{}]}})),
            Err(InvalidConfig::InvalidType)
        );
        // Type names are case sensitive.
        assert_eq!(
            validate(json!({"type": "Bar", "data": {"datasets": [{}]}})),
            Err(InvalidConfig::InvalidType)
        );
    }

    #[test]
    fn rejects_missing_data() {
        assert_eq!(
            validate(json!({"type": "line"})),
            Err(InvalidConfig::MissingData)
        );
        assert_eq!(
            validate(json!({"type": "line", "data": [1, 2]})),
            Err(InvalidConfig::MissingData)
        );
    }

    #[test]
    fn rejects_missing_datasets() {
        let err = validate(json!({"type": "line", "data": {}})).unwrap_err();
        assert_eq!(err.to_string(), "Chart data must include a datasets array");

        assert_eq!(
            validate(json!({"type": "line", "data": {"datasets": {"data": [1]}}})),
            Err(InvalidConfig::MissingDatasets)
        );
    }

    #[test]
    fn rejects_empty_datasets() {
        let err = validate(json!({"type": "pie", "data": {"datasets": []}})).unwrap_err();
        assert_eq!(err.to_string(), "Chart data must include at least one dataset");
    }

    #[test]
    fn first_failing_rule_wins() {
        // Bad type and missing data: the type rule is evaluated first.
        assert_eq!(
            validate(json!({"type": "gantt"})),
            Err(InvalidConfig::InvalidType)
        );
        // Missing data beats the datasets rules.
        assert_eq!(
            validate(json!({"type": "bar", "datasets": []})),
            Err(InvalidConfig::MissingData)
        );
    }

    #[test]
    fn does_not_check_dataset_shape() {
        let request =
            validate(json!({"type": "scatter", "data": {"datasets": [{"data": [1, 2, 3]}]}}));
        assert!(request.is_ok());
    }

    #[test]
    fn serializes_as_chart_js_config() {
        let request = validate(json!({
            "type": "doughnut",
            "data": {"datasets": [{"data": [1, 2]}]},
            "ignored": true
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"type": "doughnut", "data": {"datasets": [{"data": [1, 2]}]}})
        );
    }

    #[test]
    fn numeric_labels_are_stringified() {
        let request =
            validate(json!({"type": "line", "data": {"labels": [2024, "Q2"], "datasets": [{}]}}))
                .unwrap();
        assert_eq!(request.labels(), vec!["2024", "Q2"]);
    }
}
