//! Upstream response snapshot embedded as trailer metadata.

use std::collections::BTreeMap;

use hyper::http::{HeaderMap, StatusCode};
use serde::Serialize;

/// Pre-transform snapshot of an upstream response.
///
/// Captured before any header or status mutation, so the embedded copy
/// reflects the true upstream response even when the outer status is
/// overridden later at the boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub status_message: String,
    pub headers: BTreeMap<String, String>,
}

impl ResponseEnvelope {
    /// Snapshot status and headers of the untouched upstream response.
    pub fn capture(status: StatusCode, headers: &HeaderMap) -> Self {
        let mut header_map = BTreeMap::new();
        for (name, value) in headers {
            if let Ok(text) = value.to_str() {
                header_map.insert(name.as_str().to_string(), text.to_string());
            }
        }
        Self {
            status_code: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or("").to_string(),
            headers: header_map,
        }
    }

    /// The exact bytes appended to an augmented body.
    pub fn trailer_bytes(&self) -> Vec<u8> {
        // Strings, integers and a string map; serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}
