//! Liveness probes.
//!
//! A probe decides whether one registered agent is reachable right now. The
//! registry bounds every probe with its own timeout, so probes need not.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use agentnet_core::{AgentRuntime, ConfigError};

/// Why a single probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unhealthy status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Agent is not registered")]
    NotRegistered,

    #[error("Probe timed out after {0:?}")]
    TimedOut(Duration),
}

/// Decides whether a registered agent is reachable.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, agent: &AgentRuntime) -> Result<(), ProbeError>;
}

// ============================================================================
// PROBE MODE
// ============================================================================

/// Probe implementation selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// `GET {addr}/health` must answer with a 2xx status.
    #[default]
    Http,
    /// An existing registry record counts as live.
    Record,
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMode::Http => f.write_str("http"),
            ProbeMode::Record => f.write_str("record"),
        }
    }
}

impl FromStr for ProbeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProbeMode::Http),
            "record" => Ok(ProbeMode::Record),
            other => Err(ConfigError::InvalidValue {
                field: "liveness_probe".to_string(),
                value: other.to_string(),
                reason: "expected 'http' or 'record'".to_string(),
            }),
        }
    }
}

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

/// Probes `{scheme}://{addr}/health` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLivenessProbe {
    client: reqwest::Client,
    path: String,
}

impl HttpLivenessProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            path: "/health".to_string(),
        })
    }

    /// Override the health path (default `/health`).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn health_url(&self, agent: &AgentRuntime) -> String {
        format!("{}/{}", agent.base_url(), self.path.trim_start_matches('/'))
    }
}

#[async_trait]
impl LivenessProbe for HttpLivenessProbe {
    async fn probe(&self, agent: &AgentRuntime) -> Result<(), ProbeError> {
        let url = self.health_url(agent);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status {
                url,
                status: status.as_u16(),
            })
        }
    }
}

/// Treats every registered agent as live.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLivenessProbe;

#[async_trait]
impl LivenessProbe for RecordLivenessProbe {
    async fn probe(&self, _agent: &AgentRuntime) -> Result<(), ProbeError> {
        Ok(())
    }
}

/// Build the probe for a mode.
pub fn probe_for_mode(
    mode: ProbeMode,
    timeout: Duration,
) -> Result<std::sync::Arc<dyn LivenessProbe>, ProbeError> {
    Ok(match mode {
        ProbeMode::Http => std::sync::Arc::new(HttpLivenessProbe::new(timeout)?),
        ProbeMode::Record => std::sync::Arc::new(RecordLivenessProbe),
    })
}
