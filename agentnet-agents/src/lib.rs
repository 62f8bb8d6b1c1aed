//! Agent Network Agents - Registry and Liveness
//!
//! Tracks which agents are reachable at which address:
//! - Batch registration with case-insensitive, idempotent upsert
//! - Deregistration and runtime lookups
//! - Concurrent, timeout-bounded liveness checks through a pluggable probe
//! - Eviction of agents that stopped reporting live

pub mod probe;
pub mod registry;

pub use probe::{
    probe_for_mode, HttpLivenessProbe, LivenessProbe, ProbeError, ProbeMode, RecordLivenessProbe,
};
pub use registry::{AgentRegistry, DEFAULT_PROBE_TIMEOUT};
