//! Header-routed relay mode.
//!
//! # Responsibilities
//! - Forward any non-batch request to the host named by the routing header
//! - Enforce the relay allow-list
//! - Augment the proxied response with the envelope trailer
//!
//! # Design Decisions
//! - The envelope is captured before any header or status mutation, so the
//!   embedded copy reflects the true upstream response
//! - Hop-by-hop headers are stripped in both directions

use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};

use crate::augment::{augment_body, ResponseEnvelope};
use crate::http::server::AppState;

/// Headers that describe one hop, never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Fallback handler proxying a single request through the shared upstream
/// channel.
pub async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let relay = &state.config.relay;
    if !relay.enabled {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let target = match request
        .headers()
        .get(relay.host_header.as_str())
        .and_then(|value| value.to_str().ok())
    {
        Some(target) if !target.is_empty() => target.to_string(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Missing relay target header: {}", relay.host_header),
            )
                .into_response();
        }
    };

    if !state.allowlist.permits(&target) {
        tracing::warn!(target = %target, "Relay target not allow-listed");
        return (StatusCode::FORBIDDEN, "Relay target not allowed").into_response();
    }

    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let upstream_uri: Uri =
        match format!("{}://{}{}", relay.scheme, target, path_and_query).parse() {
            Ok(uri) => uri,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, "Invalid relay target").into_response();
            }
        };

    let request_body = match Limited::new(body, relay.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Relay request body too large")
                .into_response();
        }
    };

    let mut upstream_request = match Request::builder()
        .method(parts.method.clone())
        .uri(upstream_uri)
        .body(Full::<Bytes>::new(request_body))
    {
        Ok(request) => request,
        Err(error) => {
            tracing::error!(error = %error, "Failed to build relay request");
            return (StatusCode::BAD_REQUEST, "Invalid relay request").into_response();
        }
    };
    for (name, value) in &parts.headers {
        let lowered = name.as_str();
        if HOP_BY_HOP.contains(&lowered)
            || lowered == "host"
            || lowered.eq_ignore_ascii_case(&relay.host_header)
        {
            continue;
        }
        upstream_request.headers_mut().insert(name.clone(), value.clone());
    }

    let deadline = Duration::from_millis(relay.timeout_ms);
    let response = match tokio::time::timeout(deadline, state.channel.send(upstream_request)).await
    {
        Err(_) => {
            return (StatusCode::GATEWAY_TIMEOUT, "Relay target timed out").into_response();
        }
        Ok(Err(error)) => {
            tracing::warn!(target = %target, error = %error, "Relay request failed");
            return (StatusCode::BAD_GATEWAY, "Relay request failed").into_response();
        }
        Ok(Ok(response)) => response,
    };

    let (mut response_parts, response_body) = response.into_parts();

    // Snapshot before any mutation; this is what the trailer embeds.
    let envelope = ResponseEnvelope::capture(response_parts.status, &response_parts.headers);

    let response_body = match Limited::new(response_body, relay.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            tracing::warn!(target = %target, error = %error, "Failed to read relayed response body");
            return (StatusCode::BAD_GATEWAY, "Failed to read relayed response").into_response();
        }
    };

    for name in HOP_BY_HOP {
        response_parts.headers.remove(name);
    }

    let augmented = match augment_body(
        relay.augment,
        &mut response_parts.headers,
        response_body,
        &envelope.trailer_bytes(),
        relay.max_body_bytes,
    ) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!(target = %target, error = %error, "Failed to augment relayed response");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to augment relayed response",
            )
                .into_response();
        }
    };

    let outer_status = if relay.override_status {
        StatusCode::OK
    } else {
        response_parts.status
    };

    match Response::builder().status(outer_status).body(Body::from(augmented)) {
        Ok(mut response) => {
            *response.headers_mut() = response_parts.headers;
            response
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to build relayed response");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build relayed response")
                .into_response()
        }
    }
}
