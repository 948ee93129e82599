//! Integration tests for the batch endpoint adapter.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use fanout_gateway::config::GatewayConfig;
use fanout_gateway::http::HttpServer;
use fanout_gateway::lifecycle::Shutdown;
use serde_json::{json, Value};

mod common;

const ACCESS_KEY: &str = "test-access-key";

async fn start_gateway(mut config: GatewayConfig) -> (SocketAddr, Shutdown) {
    config.auth.access_key = ACCESS_KEY.to_string();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let listener_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, listener_shutdown).await;
    });

    (addr, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_batch_returns_keyed_results() {
    let backend = common::start_scripted_backend(|| async { (200, "pong".to_string()) }).await;
    let (addr, shutdown) = start_gateway(GatewayConfig::default()).await;

    let payload = json!([
        { "requestId": "r1", "url": format!("http://{}/one", backend) },
        { "requestId": "r2", "url": format!("http://{}/two", backend), "method": "post" },
    ]);

    let response = client()
        .post(format!("http://{}/batch", addr))
        .bearer_auth(ACCESS_KEY)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["r1"]["status"], 200);
    assert_eq!(body["r1"]["body"], "pong");
    assert_eq!(body["r1"]["error"], Value::Null);
    assert_eq!(body["r2"]["status"], 200);
    assert!(body["r1"].get("requestId").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_access_key_rejects_batch_wholesale() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let backend = common::start_scripted_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, "ok".to_string())
        }
    })
    .await;
    let (addr, shutdown) = start_gateway(GatewayConfig::default()).await;

    let payload = json!([{ "requestId": "r1", "url": format!("http://{}/", backend) }]);

    let response = client()
        .post(format!("http://{}/batch", addr))
        .bearer_auth("wrong-key")
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no item may be dispatched");

    let missing = client()
        .post(format!("http://{}/batch", addr))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 403);

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_or_non_array_payload_is_rejected() {
    let (addr, shutdown) = start_gateway(GatewayConfig::default()).await;

    let empty = client()
        .post(format!("http://{}/batch", addr))
        .bearer_auth(ACCESS_KEY)
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    let object = client()
        .post(format!("http://{}/batch", addr))
        .bearer_auth(ACCESS_KEY)
        .json(&json!({ "requestId": "r1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(object.status(), 400);

    shutdown.trigger();
}

#[tokio::test]
async fn test_partial_upstream_failure_still_returns_every_entry() {
    let backend = common::start_scripted_backend(|| async { (200, "ok".to_string()) }).await;
    let refused = common::unreachable_addr().await;
    let (addr, shutdown) = start_gateway(GatewayConfig::default()).await;

    let payload = json!([
        { "requestId": "good", "url": format!("http://{}/", backend) },
        { "requestId": "bad", "url": format!("http://{}/", refused) },
        { "url": format!("http://{}/", backend) },
    ]);

    let response = client()
        .post(format!("http://{}/batch", addr))
        .bearer_auth(ACCESS_KEY)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200, "item failures never fail the batch");
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["good"]["status"], 200);
    assert_eq!(body["bad"]["status"], 502);
    assert!(body["bad"]["error"].is_string());
    assert_eq!(body["unknown"]["status"], 400);

    shutdown.trigger();
}
