//! Shared helpers for the HTTP-level tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use agentnet_api::{create_router, NetworkConfig, NetworkService, RpcMethod};
use agentnet_test_utils::{fixtures, StubProbe};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PROBE_TIMEOUT: Duration = Duration::from_millis(200);

pub fn test_config() -> NetworkConfig {
    NetworkConfig {
        probe_timeout: PROBE_TIMEOUT,
        ..NetworkConfig::for_tests()
    }
}

pub fn service_with_probe(probe: StubProbe) -> NetworkService {
    NetworkService::with_probe(fixtures::storage(), Arc::new(probe), &test_config())
}

pub fn test_router() -> Router {
    router_with_probe(StubProbe::new())
}

pub fn router_with_probe(probe: StubProbe) -> Router {
    create_router(service_with_probe(probe), &test_config())
}

/// POST a raw body to /rpc and return status plus decoded body (null when
/// the body is empty).
pub async fn post_raw(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Call `method` with id 1 and return the whole response envelope.
pub async fn call(app: &Router, method: RpcMethod, params: Value) -> Value {
    let body = json!({
        "jsonrpc": "2.0",
        "method": method.qualified(),
        "params": params,
        "id": 1,
    });
    let (status, value) = post_raw(app, body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    value
}

/// Call `method` and return its result, failing on an error envelope.
pub async fn call_ok(app: &Router, method: RpcMethod, params: Value) -> Value {
    let envelope = call(app, method, params).await;
    assert!(
        envelope.get("error").is_none(),
        "{} failed: {}",
        method,
        envelope
    );
    envelope["result"].clone()
}

/// Call `method` and return its error object, failing on success.
pub async fn call_err(app: &Router, method: RpcMethod, params: Value) -> Value {
    let envelope = call(app, method, params).await;
    assert!(
        envelope.get("result").is_none(),
        "{} unexpectedly succeeded: {}",
        method,
        envelope
    );
    envelope["error"].clone()
}

pub async fn get(app: &Router, path: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
