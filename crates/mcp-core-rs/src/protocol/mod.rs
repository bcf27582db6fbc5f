pub mod capabilities;
pub mod constants;
pub mod error;
pub mod message;
pub mod result;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::protocol::message::{JsonRpcMessage, JsonRpcRaw, RequestId};

    #[test]
    fn test_notification_conversion() {
        let raw = JsonRpcRaw {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: Some("notifications/initialized".to_string()),
            params: Some(json!({"key": "value"})),
            result: None,
            error: None,
        };

        let message = JsonRpcMessage::try_from(raw).unwrap();
        match message {
            JsonRpcMessage::Notification(n) => {
                assert_eq!(n.jsonrpc, "2.0");
                assert_eq!(n.method, "notifications/initialized");
                assert_eq!(n.params.unwrap(), json!({"key": "value"}));
            }
            _ => panic!("Expected Notification"),
        }
    }

    #[test]
    fn test_request_conversion() {
        let raw = JsonRpcRaw {
            jsonrpc: "2.0".to_string(),
            id: Some(RequestId::Number(1)),
            method: Some("tools/call".to_string()),
            params: Some(json!({"name": "generateChart"})),
            result: None,
            error: None,
        };

        let message = JsonRpcMessage::try_from(raw).unwrap();
        match message {
            JsonRpcMessage::Request(r) => {
                assert_eq!(r.jsonrpc, "2.0");
                assert_eq!(r.id, Some(RequestId::Number(1)));
                assert_eq!(r.method, "tools/call");
            }
            _ => panic!("Expected Request"),
        }
    }

    #[test]
    fn test_string_request_id() {
        let message: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"}))
                .unwrap();
        assert!(message.is_request());
        assert_eq!(message.id(), Some(&RequestId::String("abc".to_string())));

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["id"], json!("abc"));
    }

    #[test]
    fn test_error_has_priority_over_result() {
        let message: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {"code": -32601, "message": "nope"}
        }))
        .unwrap();
        match message {
            JsonRpcMessage::Error(e) => assert_eq!(e.error.code, -32601),
            _ => panic!("Expected Error"),
        }
    }
}
