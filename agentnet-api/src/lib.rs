//! Agent Network API - JSON-RPC Layer
//!
//! Exposes the registry, thread store and message log as one flat set of
//! JSON-RPC 2.0 methods named `habiliai-agentnetwork-v1.<Method>`, served by
//! Axum at `POST /rpc`. Also provides the matching typed client, the
//! server configuration, telemetry and the stale-agent sweep.

mod macros;

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod rpc;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use client::{ClientError, ClientResult, NetworkClient, TransportError};
pub use config::{EnvSource, NetworkConfig, ProcessEnv};
pub use error::{ErrorCode, RpcError, RpcResult};
pub use jobs::{liveness_sweep_task, LivenessSweepConfig};
pub use routes::create_router;
pub use rpc::{RpcMethod, RpcRequest, RpcResponse};
pub use service::NetworkService;
pub use state::AppState;
pub use types::*;
