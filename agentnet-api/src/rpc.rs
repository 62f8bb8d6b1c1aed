//! JSON-RPC 2.0 envelope and method catalogue.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::constants::{JSONRPC_VERSION, METHOD_PREFIX};
use crate::error::RpcError;

// ============================================================================
// METHODS
// ============================================================================

/// Every method exposed under [`METHOD_PREFIX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    CreateThread,
    GetThread,
    GetThreads,
    AddMessage,
    GetMessages,
    GetNumMessages,
    DeleteMessage,
    IsMentionedOnce,
    RegisterAgent,
    DeregisterAgent,
    CheckLive,
    GetAgentRuntimeInfo,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 12] = [
        RpcMethod::CreateThread,
        RpcMethod::GetThread,
        RpcMethod::GetThreads,
        RpcMethod::AddMessage,
        RpcMethod::GetMessages,
        RpcMethod::GetNumMessages,
        RpcMethod::DeleteMessage,
        RpcMethod::IsMentionedOnce,
        RpcMethod::RegisterAgent,
        RpcMethod::DeregisterAgent,
        RpcMethod::CheckLive,
        RpcMethod::GetAgentRuntimeInfo,
    ];

    /// Unqualified method name.
    pub fn name(&self) -> &'static str {
        match self {
            RpcMethod::CreateThread => "CreateThread",
            RpcMethod::GetThread => "GetThread",
            RpcMethod::GetThreads => "GetThreads",
            RpcMethod::AddMessage => "AddMessage",
            RpcMethod::GetMessages => "GetMessages",
            RpcMethod::GetNumMessages => "GetNumMessages",
            RpcMethod::DeleteMessage => "DeleteMessage",
            RpcMethod::IsMentionedOnce => "IsMentionedOnce",
            RpcMethod::RegisterAgent => "RegisterAgent",
            RpcMethod::DeregisterAgent => "DeregisterAgent",
            RpcMethod::CheckLive => "CheckLive",
            RpcMethod::GetAgentRuntimeInfo => "GetAgentRuntimeInfo",
        }
    }

    /// Wire name, e.g. `habiliai-agentnetwork-v1.CreateThread`.
    pub fn qualified(&self) -> String {
        format!("{}.{}", METHOD_PREFIX, self.name())
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", METHOD_PREFIX, self.name())
    }
}

impl FromStr for RpcMethod {
    type Err = RpcError;

    /// Parses a fully qualified method name. Matching is exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(METHOD_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|name| Self::ALL.into_iter().find(|m| m.name() == name))
            .ok_or_else(|| RpcError::method_not_found(s))
    }
}

// ============================================================================
// ENVELOPE
// ============================================================================

/// A validated request envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    /// Always an object; absent or null params become `{}`.
    pub params: Value,
    /// `None` marks a notification.
    pub id: Option<Value>,
}

impl RpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate a decoded body. On failure returns the best-known id (null
    /// when it could not be read) together with the error.
    pub fn from_value(body: Value) -> Result<Self, (Value, RpcError)> {
        let mut object = match body {
            Value::Object(map) => map,
            Value::Array(_) => {
                return Err((
                    Value::Null,
                    RpcError::invalid_request("Batch requests are not supported"),
                ))
            }
            _ => {
                return Err((
                    Value::Null,
                    RpcError::invalid_request("Request must be a JSON object"),
                ))
            }
        };

        let id = match object.remove("id") {
            None => None,
            Some(id @ (Value::Null | Value::String(_) | Value::Number(_))) => Some(id),
            Some(_) => {
                return Err((
                    Value::Null,
                    RpcError::invalid_request("id must be a string, number or null"),
                ))
            }
        };
        let reply_id = id.clone().unwrap_or(Value::Null);

        match object.get("jsonrpc") {
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            _ => {
                return Err((
                    reply_id,
                    RpcError::invalid_request(format!("jsonrpc must be \"{}\"", JSONRPC_VERSION)),
                ))
            }
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => {
                return Err((reply_id, RpcError::invalid_request("method must be a string")))
            }
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(params @ Value::Object(_)) => params,
            Some(_) => {
                return Err((reply_id, RpcError::invalid_params("params must be an object")))
            }
        };

        Ok(Self { method, params, id })
    }
}

/// Outgoing request built by the client.
#[derive(Debug, Serialize)]
pub struct OutgoingRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: &'a P,
    pub id: u64,
}

impl<'a, P: Serialize> OutgoingRequest<'a, P> {
    pub fn new(method: RpcMethod, params: &'a P, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.qualified(),
            params,
            id,
        }
    }
}

/// Response envelope. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match (self.error, self.result) {
            (Some(err), _) => Err(err),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
