//! JSON-RPC 2.0 message types for the MCP transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revisions this server can speak, oldest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// JSON-RPC 2.0 request or notification.
///
/// A message without `id` is a notification and gets no reply.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// Protocol tag; `"2.0"` when present.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Method name, e.g. `tools/call`.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
    /// Request id, echoed in the response.
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcRequest {
    /// Whether the sender expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Id of the request answered; `null` when it could not be read.
    pub id: Value,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Extra detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes

/// Message is not valid JSON.
pub const PARSE_ERROR: i32 = -32700;
/// Message is JSON but not a request.
pub const INVALID_REQUEST: i32 = -32600;
/// Unknown method.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Bad or missing parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Server-side failure outside the tool itself.
pub const INTERNAL_ERROR: i32 = -32603;

impl RpcResponse {
    /// Successful reply carrying `result`.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Error reply with an explicit code.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// `-32601` for `method`.
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    /// `-32602` with `msg`.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, msg)
    }

    /// `-32600` with `msg`.
    pub fn invalid_request(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_REQUEST, msg)
    }

    /// `-32603` with `msg`.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INTERNAL_ERROR, msg)
    }

    /// `-32700`, id `null`.
    pub fn parse_error() -> Self {
        Self::error(None, PARSE_ERROR, "Parse error")
    }
}

/// Extract a required string param from the RPC params object.
pub fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing required parameter: {key}"))
}

/// Version to answer `initialize` with: the client's if supported, else the newest.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
        .or(SUPPORTED_PROTOCOL_VERSIONS.last())
        .copied()
        .unwrap_or("2025-06-18")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_request_and_notification() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.id, Some(json!(7)));
        assert!(!req.is_notification());

        let note: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(note.is_notification());
        assert!(note.params.is_none());
    }

    #[test]
    fn success_omits_error() {
        let json = serde_json::to_value(RpcResponse::success(Some(json!("a")), json!({}))).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], "a");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_has_numeric_code_and_null_id() {
        let json = serde_json::to_value(RpcResponse::parse_error()).unwrap();
        assert_eq!(json["error"]["code"], PARSE_ERROR);
        assert_eq!(json["error"]["message"], "Parse error");
        assert!(json["id"].is_null());
        assert!(json.get("result").is_none());
    }

    #[test]
    fn internal_error_echoes_id() {
        let json = serde_json::to_value(RpcResponse::internal_error(Some(json!(9)), "boom")).unwrap();
        assert_eq!(json["error"]["code"], INTERNAL_ERROR);
        assert_eq!(json["error"]["code"], -32603);
        assert_eq!(json["error"]["message"], "boom");
        assert_eq!(json["id"], 9);
        assert!(json.get("result").is_none());
    }

    #[test]
    fn require_str_reports_missing_key() {
        let params = json!({"name": "transcribe"});
        assert_eq!(require_str(&params, "name"), Ok("transcribe"));
        assert_eq!(
            require_str(&params, "arguments"),
            Err("Missing required parameter: arguments".to_string())
        );
    }

    #[test]
    fn version_negotiation() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("1999-01-01")), "2025-06-18");
        assert_eq!(negotiate_version(None), "2025-06-18");
    }
}
