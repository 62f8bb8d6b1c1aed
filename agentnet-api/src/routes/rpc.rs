//! The JSON-RPC endpoint.
//!
//! Every well-formed failure is answered with HTTP 200 and an error
//! envelope. Requests without an id are notifications: they run and get an
//! empty 204.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::time::Instant;

use crate::error::{ErrorCode, RpcError};
use crate::rpc::{RpcMethod, RpcRequest, RpcResponse};
use crate::service::NetworkService;
use crate::telemetry::metrics;

/// POST /rpc
pub async fn handle_rpc(State(service): State<NetworkService>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected unparseable RPC body");
            return reply(RpcResponse::failure(
                Value::Null,
                RpcError::parse_error(e.to_string()),
            ));
        }
    };

    let RpcRequest { method, params, id } = match RpcRequest::from_value(value) {
        Ok(request) => request,
        Err((id, err)) => {
            tracing::debug!(error = %err, "Rejected invalid RPC envelope");
            return reply(RpcResponse::failure(id, err));
        }
    };

    let start = Instant::now();
    let parsed = method.parse::<RpcMethod>();
    let label = parsed.as_ref().map(|m| m.name()).unwrap_or("unknown");
    let outcome = match parsed {
        Ok(m) => service.dispatch(m, params).await,
        Err(e) => Err(e),
    };
    let elapsed = start.elapsed();

    log_call(&method, label, &outcome, elapsed.as_secs_f64());

    match id {
        None => StatusCode::NO_CONTENT.into_response(),
        Some(id) => reply(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(err) => RpcResponse::failure(id, err),
        }),
    }
}

fn reply(response: RpcResponse) -> Response {
    (StatusCode::OK, Json(response)).into_response()
}

fn log_call(method: &str, label: &str, outcome: &Result<Value, RpcError>, duration_secs: f64) {
    let duration_ms = duration_secs * 1000.0;
    let result_label = match outcome {
        Ok(_) => {
            tracing::info!(rpc.method = method, duration_ms, "RPC call succeeded");
            "ok"
        }
        Err(err) if err.code == ErrorCode::InternalError => {
            tracing::error!(
                rpc.method = method,
                duration_ms,
                error.kind = err.code.kind(),
                error = %err.message,
                "RPC call failed"
            );
            err.code.kind()
        }
        Err(err) => {
            tracing::warn!(
                rpc.method = method,
                duration_ms,
                error.kind = err.code.kind(),
                error = %err.message,
                "RPC call rejected"
            );
            err.code.kind()
        }
    };

    if let Some(m) = metrics() {
        m.record_rpc_call(label, result_label, duration_secs);
    }
}
