//! Batch item and result types.

use std::collections::BTreeMap;

use hyper::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

/// Fallback key for items submitted without a request ID.
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// One sub-request within a batch call.
///
/// Every field is optional at parse time so a malformed item degrades to a
/// per-item validation result instead of rejecting the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchItem {
    /// Caller-supplied identifier, unique within the batch.
    pub request_id: Option<String>,

    /// Absolute URL of the sub-request target.
    pub url: Option<String>,

    /// HTTP method; defaults to GET.
    pub method: Option<String>,

    /// Extra headers, overriding the gateway defaults.
    pub headers: Option<BTreeMap<String, String>>,

    /// Optional protocol override ("http" or "https") applied to the URL.
    pub proto: Option<String>,
}

impl BatchItem {
    /// The identifier this item's result is keyed by.
    pub fn result_key(&self) -> String {
        match &self.request_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => UNKNOWN_REQUEST_ID.to_string(),
        }
    }
}

/// Outcome of one sub-request. Exactly one exists per submitted item.
///
/// `request_id` becomes the key of the serialized result map and is not
/// repeated inside the value.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    #[serde(skip_serializing)]
    pub request_id: String,

    /// Upstream HTTP status, or a synthetic code for local failures.
    pub status: u16,

    /// Upstream response headers (empty for local failures).
    pub headers: BTreeMap<String, String>,

    /// Buffered response body, lossily decoded to text.
    pub body: String,

    /// Failure description, `null` on success.
    pub error: Option<String>,
}

impl BatchResult {
    /// Successful upstream response.
    pub fn upstream(
        request_id: String,
        status: StatusCode,
        headers: &HeaderMap,
        body: String,
    ) -> Self {
        let mut header_map = BTreeMap::new();
        for (name, value) in headers {
            if let Ok(text) = value.to_str() {
                header_map.insert(name.as_str().to_string(), text.to_string());
            }
        }
        Self {
            request_id,
            status: status.as_u16(),
            headers: header_map,
            body,
            error: None,
        }
    }

    /// Item rejected before any network call.
    pub fn validation(request_id: String, message: impl Into<String>) -> Self {
        Self::synthetic(request_id, 400, message.into())
    }

    /// Lower-level transport fault (connect, TLS, premature close).
    pub fn transport(request_id: String, message: impl Into<String>) -> Self {
        Self::synthetic(request_id, 502, message.into())
    }

    /// No response within the per-item deadline.
    pub fn timeout(request_id: String) -> Self {
        Self::synthetic(request_id, 504, "Request timeout".to_string())
    }

    /// Unexpected fault while processing the item.
    pub fn internal(request_id: String) -> Self {
        Self::synthetic(request_id, 500, "Internal error".to_string())
    }

    fn synthetic(request_id: String, status: u16, message: String) -> Self {
        Self {
            request_id,
            status,
            headers: BTreeMap::new(),
            body: String::new(),
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_key_falls_back_to_unknown() {
        let item = BatchItem::default();
        assert_eq!(item.result_key(), "unknown");

        let item = BatchItem {
            request_id: Some(String::new()),
            ..BatchItem::default()
        };
        assert_eq!(item.result_key(), "unknown");

        let item = BatchItem {
            request_id: Some("r1".to_string()),
            ..BatchItem::default()
        };
        assert_eq!(item.result_key(), "r1");
    }

    #[test]
    fn test_result_serializes_without_request_id() {
        let result = BatchResult::timeout("r9".to_string());
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("requestId").is_none());
        assert!(json.get("request_id").is_none());
        assert_eq!(json["status"], 504);
        assert_eq!(json["error"], "Request timeout");
    }

    #[test]
    fn test_item_parses_from_camel_case() {
        let item: BatchItem = serde_json::from_value(serde_json::json!({
            "requestId": "a",
            "url": "http://example.com/",
            "method": "POST",
            "headers": {"x-extra": "1"}
        }))
        .unwrap();

        assert_eq!(item.request_id.as_deref(), Some("a"));
        assert_eq!(item.method.as_deref(), Some("POST"));
    }
}
