use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    /// Media type of the text payload, e.g. `text/html` for embeddable markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Base64-encoded image bytes
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    Text(TextContent),
    Image(ImageContent),
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(TextContent {
            text: text.into(),
            mime_type: None,
        })
    }

    pub fn text_with_mime<S: Into<String>, T: Into<String>>(text: S, mime_type: T) -> Self {
        Content::Text(TextContent {
            text: text.into(),
            mime_type: Some(mime_type.into()),
        })
    }

    pub fn image<S: Into<String>, T: Into<String>>(data: S, mime_type: T) -> Self {
        Content::Image(ImageContent {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Get the image content if this is an ImageContent variant
    pub fn as_image(&self) -> Option<(&str, &str)> {
        match self {
            Content::Image(image) => Some((&image.data, &image.mime_type)),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Content::Text(text) => text.mime_type.as_deref(),
            Content::Image(image) => Some(&image.mime_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let value = serde_json::to_value(Content::image("AAAA", "image/png")).unwrap();
        assert_eq!(
            value,
            json!({"type": "image", "data": "AAAA", "mimeType": "image/png"})
        );

        let value = serde_json::to_value(Content::text("hi")).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hi"}));
    }

    #[test]
    fn html_text_carries_mime_type() {
        let content = Content::text_with_mime("<div></div>", "text/html");
        assert_eq!(content.as_text(), Some("<div></div>"));
        assert_eq!(content.mime_type(), Some("text/html"));
        assert!(content.as_image().is_none());
    }
}
