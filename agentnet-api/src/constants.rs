//! Constants shared across the server, client and background jobs.

// ============================================================================
// PROTOCOL
// ============================================================================

/// JSON-RPC protocol version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";

/// Namespace of every exposed method: `<prefix>.<MethodName>`.
pub const METHOD_PREFIX: &str = "habiliai-agentnetwork-v1";

/// HTTP path of the JSON-RPC endpoint.
pub const RPC_PATH: &str = "/rpc";

/// HTTP path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// HTTP path of the Prometheus endpoint.
pub const METRICS_PATH: &str = "/metrics";

// ============================================================================
// SERVER DEFAULTS
// ============================================================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9080;

/// Maximum accepted request body (bytes).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Per-agent liveness probe timeout.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;

// ============================================================================
// LIVENESS SWEEP DEFAULTS
// ============================================================================

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Agents not seen live for this long are evicted (2.5 minutes).
pub const DEFAULT_STALE_AFTER_SECS: u64 = 150;

// ============================================================================
// CLIENT DEFAULTS
// ============================================================================

pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 30;
