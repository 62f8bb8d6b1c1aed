//! Error Types for the Agent Network RPC layer
//!
//! This module defines error handling at the protocol boundary:
//! - ErrorCode enum with the JSON-RPC code of each error kind
//! - RpcError struct carried in the `error` member of a response
//! - Conversions from every component error
//!
//! On the wire an error is `{code, message, data: {kind, ...details}}`.
//! Callers branch on `code` or `data.kind`, never on `message`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use agentnet_core::{ConfigError, NetworkError, StorageError, ValidationError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Envelope Errors (JSON-RPC reserved range)
    // ========================================================================
    /// Body is not valid JSON
    ParseError,

    /// Envelope or field values are invalid
    InvalidRequest,

    /// Method name is not part of the protocol
    MethodNotFound,

    /// Params do not match the method's request shape
    InvalidParams,

    /// Unexpected server-side failure
    InternalError,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Referenced thread or message does not exist
    NotFound,

    /// Identifier collision in the storage backend
    Conflict,

    /// One or more agents did not answer a liveness probe
    LivenessFailed,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::ParseError,
        ErrorCode::InvalidRequest,
        ErrorCode::MethodNotFound,
        ErrorCode::InvalidParams,
        ErrorCode::InternalError,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::LivenessFailed,
    ];

    /// JSON-RPC error code.
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::NotFound => -32004,
            ErrorCode::Conflict => -32009,
            ErrorCode::LivenessFailed => -32010,
        }
    }

    /// Reverse of [`ErrorCode::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Stable string used in `data.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::InvalidParams => "INVALID_PARAMS",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::LivenessFailed => "LIVENESS_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

// ============================================================================
// RPC ERROR
// ============================================================================

/// Structured error returned by every RPC method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireError", from = "WireError")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    /// Extra machine-readable fields merged into `data`.
    pub details: Option<Value>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireError {
    code: i64,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl From<RpcError> for WireError {
    fn from(err: RpcError) -> Self {
        let mut data = match err.details {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("details".to_string(), other);
                map
            }
            None => Map::new(),
        };
        data.insert("kind".to_string(), Value::String(err.code.kind().to_string()));
        WireError {
            code: err.code.code(),
            message: err.message,
            data: Some(Value::Object(data)),
        }
    }
}

impl From<WireError> for RpcError {
    fn from(wire: WireError) -> Self {
        let mut data = match wire.data {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("details".to_string(), other);
                map
            }
            None => Map::new(),
        };
        let from_kind = data
            .remove("kind")
            .and_then(|kind| serde_json::from_value::<ErrorCode>(kind).ok());
        let code = from_kind
            .or_else(|| ErrorCode::from_code(wire.code))
            .unwrap_or(ErrorCode::InternalError);
        RpcError {
            code,
            message: wire.message,
            details: if data.is_empty() {
                None
            } else {
                Some(Value::Object(data))
            },
        }
    }
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("Method not found: {}", method))
            .with_details(json!({ "method": method }))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Names of unreachable agents, for `LivenessFailed` errors.
    pub fn unreachable(&self) -> Vec<String> {
        self.details
            .as_ref()
            .and_then(|d| d.get("unreachable"))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.code.code(), self.message)
    }
}

impl std::error::Error for RpcError {}

/// Result type alias for RPC handlers.
pub type RpcResult<T> = Result<T, RpcError>;

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<NetworkError> for RpcError {
    fn from(err: NetworkError) -> Self {
        let message = err.to_string();
        match err {
            NetworkError::Validation(inner) => {
                let details = match &inner {
                    ValidationError::RequiredFieldMissing { field }
                    | ValidationError::InvalidValue { field, .. } => json!({ "field": field }),
                    ValidationError::NotAParticipant { thread_id, sender } => {
                        json!({ "thread_id": thread_id, "sender": sender })
                    }
                };
                RpcError::invalid_request(message).with_details(details)
            }
            NetworkError::Storage(StorageError::ThreadNotFound { id }) => {
                RpcError::not_found(message).with_details(json!({ "thread_id": id }))
            }
            NetworkError::Storage(StorageError::MessageNotFound { id }) => {
                RpcError::not_found(message).with_details(json!({ "message_id": id }))
            }
            NetworkError::Storage(StorageError::IdConflict { entity, id }) => {
                RpcError::new(ErrorCode::Conflict, message)
                    .with_details(json!({ "entity": entity, "id": id }))
            }
            NetworkError::Storage(StorageError::LockPoisoned) => RpcError::internal_error(message),
            NetworkError::Liveness(inner) => RpcError::new(ErrorCode::LivenessFailed, message)
                .with_details(json!({ "unreachable": inner.unreachable })),
            NetworkError::Config(_) => RpcError::internal_error(message),
        }
    }
}

impl From<ValidationError> for RpcError {
    fn from(err: ValidationError) -> Self {
        NetworkError::from(err).into()
    }
}

impl From<ConfigError> for RpcError {
    fn from(err: ConfigError) -> Self {
        RpcError::internal_error(err.to_string())
    }
}

/// Params that fail to deserialize are a shape mismatch.
impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::invalid_params(err.to_string())
    }
}

/// Bare error response with a null id, for failures that happen before the
/// request id is known.
impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = json!({
            "jsonrpc": crate::constants::JSONRPC_VERSION,
            "error": self,
            "id": Value::Null,
        });
        (StatusCode::OK, Json(body)).into_response()
    }
}

// ============================================================================
// TESTS
// ============================================================================
