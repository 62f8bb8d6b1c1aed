//! Liveness Sweep Background Task
//!
//! Periodically evicts agents whose last successful liveness observation
//! (registration or `CheckLive`) is older than the stale threshold. An agent
//! that keeps heartbeating is never evicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use agentnet_agents::AgentRegistry;
use agentnet_core::ConfigError;

use crate::config::{parse_flag, parse_var, EnvSource, ProcessEnv};
use crate::constants::{DEFAULT_STALE_AFTER_SECS, DEFAULT_SWEEP_INTERVAL_SECS};
use crate::telemetry::metrics;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the liveness sweep.
#[derive(Debug, Clone)]
pub struct LivenessSweepConfig {
    /// Whether the task runs at all (default: true)
    pub enabled: bool,

    /// How often to sweep (default: 60 seconds)
    pub check_interval: Duration,

    /// Agents not seen live for longer than this are removed
    /// (default: 150 seconds)
    pub stale_after: Duration,
}

impl Default for LivenessSweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
        }
    }
}

impl LivenessSweepConfig {
    /// # Environment Variables
    /// - `AGENTNET_SWEEP_ENABLED` (default: true)
    /// - `AGENTNET_SWEEP_INTERVAL_SECS` (default: 60)
    /// - `AGENTNET_STALE_AFTER_SECS` (default: 150)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: parse_flag(env, "AGENTNET_SWEEP_ENABLED", true)?,
            check_interval: Duration::from_secs(parse_var(
                env,
                "AGENTNET_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )?),
            stale_after: Duration::from_secs(parse_var(
                env,
                "AGENTNET_STALE_AFTER_SECS",
                DEFAULT_STALE_AFTER_SECS,
            )?),
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for sweep activity since startup.
#[derive(Debug, Default)]
pub struct LivenessSweepMetrics {
    pub sweeps: AtomicU64,
    pub agents_evicted: AtomicU64,
    pub sweep_errors: AtomicU64,
}

impl LivenessSweepMetrics {
    pub fn snapshot(&self) -> LivenessSweepSnapshot {
        LivenessSweepSnapshot {
            sweeps: self.sweeps.load(Ordering::Relaxed),
            agents_evicted: self.agents_evicted.load(Ordering::Relaxed),
            sweep_errors: self.sweep_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessSweepSnapshot {
    pub sweeps: u64,
    pub agents_evicted: u64,
    pub sweep_errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Sweep stale agents until `shutdown_rx` turns true.
///
/// Returns the counters collected over the task's lifetime.
pub async fn liveness_sweep_task(
    registry: AgentRegistry,
    config: LivenessSweepConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<LivenessSweepMetrics> {
    let counters = Arc::new(LivenessSweepMetrics::default());

    let mut ticker = interval(config.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        check_interval_secs = config.check_interval.as_secs(),
        stale_after_secs = config.stale_after.as_secs(),
        "Liveness sweep task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Liveness sweep task shutting down");
                    break;
                }
            }
            _ = ticker.tick() => {
                sweep_once(&registry, &config, &counters);
            }
        }
    }

    let snapshot = counters.snapshot();
    tracing::info!(
        sweeps = snapshot.sweeps,
        agents_evicted = snapshot.agents_evicted,
        sweep_errors = snapshot.sweep_errors,
        "Liveness sweep task completed"
    );
    counters
}

/// Run one sweep cycle.
pub fn sweep_once(
    registry: &AgentRegistry,
    config: &LivenessSweepConfig,
    counters: &LivenessSweepMetrics,
) {
    counters.sweeps.fetch_add(1, Ordering::Relaxed);
    match registry.sweep_stale(config.stale_after) {
        Ok(removed) if removed.is_empty() => {
            tracing::trace!("Liveness sweep found no stale agents");
        }
        Ok(removed) => {
            counters
                .agents_evicted
                .fetch_add(removed.len() as u64, Ordering::Relaxed);
            tracing::info!(evicted = removed.len(), agents = ?removed, "Liveness sweep evicted agents");
            if let Some(m) = metrics() {
                m.record_swept_agents(removed.len());
                if let Ok(count) = registry.count() {
                    m.set_registered_agents(count);
                }
            }
        }
        Err(e) => {
            counters.sweep_errors.fetch_add(1, Ordering::Relaxed);
            tracing::error!(error = %e, "Liveness sweep failed");
        }
    }
}
