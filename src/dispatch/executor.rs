//! Sub-request execution.
//!
//! # Responsibilities
//! - Validate one batch item (identifier, URL, scheme, method, headers)
//! - Issue the outbound call through the shared upstream channel
//! - Enforce the per-item deadline, aborting the in-flight call on expiry
//! - Map every outcome into a `BatchResult`; this surface never fails
//!
//! # Design Decisions
//! - Validation failures resolve locally with status 400; no network call
//! - Timeouts are synthetic 504, transport faults synthetic 502
//! - The response body is fully buffered, bounded by a configured cap

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::http::header::{HeaderName, HeaderValue};
use hyper::http::{Method, Request, Uri};
use url::Url;

use crate::config::DispatchConfig;
use crate::dispatch::types::{BatchItem, BatchResult};
use crate::upstream::UpstreamChannel;

/// Execute one sub-request against the upstream channel.
///
/// Total over its input: every exit path resolves a `BatchResult`, nothing
/// propagates past this boundary.
pub async fn execute(
    item: &BatchItem,
    config: &DispatchConfig,
    channel: &UpstreamChannel,
) -> BatchResult {
    let request_id = item.result_key();

    if item.request_id.as_deref().unwrap_or("").is_empty() {
        return BatchResult::validation(request_id, "Missing required field: requestId");
    }

    let raw_url = match item.url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => return BatchResult::validation(request_id, "Missing required field: url"),
    };

    let mut url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(error) => {
            return BatchResult::validation(request_id, format!("Invalid URL: {error}"));
        }
    };

    if let Some(proto) = item.proto.as_deref() {
        if !matches!(proto, "http" | "https") || url.set_scheme(proto).is_err() {
            return BatchResult::validation(
                request_id,
                format!("Unsupported protocol override: {proto}"),
            );
        }
    }

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return BatchResult::validation(
                request_id,
                format!("Unsupported URL scheme: {other}"),
            );
        }
    }

    let method_token = item.method.as_deref().unwrap_or("GET");
    let method = match Method::from_bytes(method_token.to_ascii_uppercase().as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            return BatchResult::validation(
                request_id,
                format!("Invalid HTTP method: {method_token}"),
            );
        }
    };

    let uri = match url.as_str().parse::<Uri>() {
        Ok(uri) => uri,
        Err(error) => {
            return BatchResult::validation(request_id, format!("Invalid URL: {error}"));
        }
    };

    let mut headers = channel.default_headers().clone();
    if let Some(extra) = &item.headers {
        for (name, value) in extra {
            let name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => name,
                Err(_) => {
                    return BatchResult::validation(
                        request_id,
                        format!("Invalid header name: {name}"),
                    );
                }
            };
            let value = match HeaderValue::from_str(value) {
                Ok(value) => value,
                Err(_) => {
                    return BatchResult::validation(
                        request_id,
                        format!("Invalid value for header: {name}"),
                    );
                }
            };
            headers.insert(name, value);
        }
    }

    let mut request = match Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::new()))
    {
        Ok(request) => request,
        Err(error) => {
            return BatchResult::validation(request_id, format!("Invalid request: {error}"));
        }
    };
    *request.headers_mut() = headers;

    let deadline = Duration::from_millis(config.per_item_timeout_ms);
    let response = match tokio::time::timeout(deadline, channel.send(request)).await {
        // Dropping the timed-out future aborts the in-flight call and
        // releases its connection back to the runtime.
        Err(_) => {
            tracing::debug!(request_id = %request_id, timeout_ms = config.per_item_timeout_ms, "Sub-request timed out");
            return BatchResult::timeout(request_id);
        }
        Ok(Err(error)) => {
            let message = error_chain(&error);
            tracing::debug!(request_id = %request_id, error = %message, "Upstream transport fault");
            return BatchResult::transport(request_id, message);
        }
        Ok(Ok(response)) => response,
    };

    let (parts, body) = response.into_parts();
    let limited = Limited::new(body, config.max_response_bytes);
    match limited.collect().await {
        Ok(collected) => {
            let text = String::from_utf8_lossy(&collected.to_bytes()).into_owned();
            BatchResult::upstream(request_id, parts.status, &parts.headers, text)
        }
        Err(error) => BatchResult::transport(
            request_id,
            format!("Failed to read upstream response body: {error}"),
        ),
    }
}

/// Flatten an error and its sources into one message.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
