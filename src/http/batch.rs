//! Batch endpoint adapter.
//!
//! # Responsibilities
//! - Verify the caller's access key before anything else
//! - Validate the batch payload shape (non-empty JSON array)
//! - Hand the items to the dispatcher and serialize the keyed result map
//!
//! # Design Decisions
//! - Batch-level rejections (auth, payload shape) are the only non-2xx
//!   responses; individual item failures ride inside the result map
//! - A malformed array element degrades to an empty item, which the
//!   executor resolves as a per-item validation result

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::dispatch::{self, BatchItem};
use crate::http::server::AppState;
use crate::observability::metrics::record_batch;
use crate::security::{bearer_token, verify_access_key};

/// `POST /batch`: dispatch a batch of sub-requests and return a JSON
/// object keyed by request ID.
pub async fn batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    let supplied = match bearer_token(&headers) {
        Some(token) => token,
        None => {
            record_batch("auth_rejected", 0);
            return reject(StatusCode::FORBIDDEN, "Missing access key");
        }
    };
    if !verify_access_key(supplied, &state.config.auth.access_key) {
        record_batch("auth_rejected", 0);
        return reject(StatusCode::FORBIDDEN, "Invalid access key");
    }

    let entries = match payload {
        Value::Array(entries) if !entries.is_empty() => entries,
        Value::Array(_) => {
            record_batch("payload_rejected", 0);
            return reject(StatusCode::BAD_REQUEST, "Batch must not be empty");
        }
        _ => {
            record_batch("payload_rejected", 0);
            return reject(StatusCode::BAD_REQUEST, "Batch payload must be a JSON array");
        }
    };

    let items: Vec<BatchItem> = entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect();

    let batch_id = Uuid::new_v4();
    tracing::info!(batch_id = %batch_id, items = items.len(), "Dispatching batch");

    let results = dispatch::dispatch(items, &state.config.dispatch, state.channel.clone()).await;
    record_batch("dispatched", results.len());

    let mut keyed = Map::with_capacity(results.len());
    for result in results {
        let key = result.request_id.clone();
        keyed.insert(key, serde_json::to_value(&result).unwrap_or(Value::Null));
    }
    Json(Value::Object(keyed)).into_response()
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
