//! Server Configuration Module
//!
//! Configuration is loaded from `AGENTNET_*` environment variables with
//! defaults suitable for local development. Values that are present but
//! malformed are rejected instead of silently replaced.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use agentnet_agents::ProbeMode;
use agentnet_core::ConfigError;

use crate::constants::{DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, DEFAULT_PROBE_TIMEOUT_MS};
use crate::jobs::LivenessSweepConfig;
use crate::telemetry::TelemetryConfig;

// ============================================================================
// ENVIRONMENT HELPERS
// ============================================================================

/// Source of configuration values, keyed by variable name.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Parse `key` if set and non-empty, otherwise use `default`.
pub(crate) fn parse_var<T: FromStr>(
    env: &dyn EnvSource,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match env.get(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw.clone(),
            reason: format!("cannot parse as {}", std::any::type_name::<T>()),
        }),
    }
}

/// Parse a boolean flag. Accepts true/false, 1/0, yes/no, on/off.
pub(crate) fn parse_flag(env: &dyn EnvSource, key: &str, default: bool) -> Result<bool, ConfigError> {
    match env.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                field: key.to_string(),
                value: v,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

fn non_zero(field: &str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

/// Complete configuration of the Agent Network server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Allowed CORS origins. Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// How `CheckLive` decides an agent is reachable.
    pub liveness_probe: ProbeMode,

    /// Bound on a single agent's liveness probe.
    pub probe_timeout: Duration,

    /// Stale-agent eviction.
    pub sweep: LivenessSweepConfig,

    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            liveness_probe: ProbeMode::Http,
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            sweep: LivenessSweepConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Create NetworkConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AGENTNET_HOST`: Bind host (default: 0.0.0.0)
    /// - `AGENTNET_PORT` or `PORT`: Bind port (default: 9080)
    /// - `AGENTNET_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `AGENTNET_MAX_BODY_BYTES`: Request body limit (default: 4 MiB)
    /// - `AGENTNET_LIVENESS_PROBE`: `http` or `record` (default: http)
    /// - `AGENTNET_PROBE_TIMEOUT_MS`: Per-agent probe timeout (default: 3000)
    /// - plus the variables read by [`LivenessSweepConfig`] and [`TelemetryConfig`]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let host = env
            .get("AGENTNET_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match env.get("AGENTNET_PORT").filter(|p| !p.trim().is_empty()) {
            Some(_) => parse_var(env, "AGENTNET_PORT", DEFAULT_PORT)?,
            None => parse_var(env, "PORT", DEFAULT_PORT)?,
        };

        let cors_origins = env
            .get("AGENTNET_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            host,
            port,
            cors_origins,
            max_body_bytes: parse_var(env, "AGENTNET_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            liveness_probe: parse_var(env, "AGENTNET_LIVENESS_PROBE", ProbeMode::Http)?,
            probe_timeout: Duration::from_millis(parse_var(
                env,
                "AGENTNET_PROBE_TIMEOUT_MS",
                DEFAULT_PROBE_TIMEOUT_MS,
            )?),
            sweep: LivenessSweepConfig::from_source(env)?,
            telemetry: TelemetryConfig::from_source(env)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("AGENTNET_PROBE_TIMEOUT_MS", self.probe_timeout)?;
        if self.sweep.enabled {
            non_zero("AGENTNET_SWEEP_INTERVAL_SECS", self.sweep.check_interval)?;
            non_zero("AGENTNET_STALE_AFTER_SECS", self.sweep.stale_after)?;
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AGENTNET_MAX_BODY_BYTES".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        self.bind_addr().map(|_| ())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "AGENTNET_HOST".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }

    /// True if any origin is allowed.
    pub fn cors_allow_all(&self) -> bool {
        self.cors_origins.is_empty()
    }

    /// Configuration for tests: record probe, short timeouts, no sweep.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            liveness_probe: ProbeMode::Record,
            probe_timeout: Duration::from_millis(500),
            sweep: LivenessSweepConfig::disabled(),
            ..Self::default()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NetworkConfig::from_source(&source(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9080);
        assert!(config.cors_allow_all());
        assert_eq!(config.liveness_probe, ProbeMode::Http);
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert!(config.sweep.enabled);
        assert_eq!(config.sweep.stale_after, Duration::from_secs(150));
    }

    #[test]
    fn test_overrides() {
        let config = NetworkConfig::from_source(&source(&[
            ("AGENTNET_HOST", "127.0.0.1"),
            ("PORT", "8123"),
            ("AGENTNET_CORS_ORIGINS", "https://a.dev, https://b.dev,"),
            ("AGENTNET_LIVENESS_PROBE", "record"),
            ("AGENTNET_PROBE_TIMEOUT_MS", "250"),
            ("AGENTNET_SWEEP_ENABLED", "off"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8123");
        assert_eq!(config.cors_origins, vec!["https://a.dev", "https://b.dev"]);
        assert_eq!(config.liveness_probe, ProbeMode::Record);
        assert_eq!(config.probe_timeout, Duration::from_millis(250));
        assert!(!config.sweep.enabled);
    }

    #[test]
    fn test_agentnet_port_wins_over_port() {
        let config =
            NetworkConfig::from_source(&source(&[("AGENTNET_PORT", "7000"), ("PORT", "8000")]))
                .unwrap();
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(NetworkConfig::from_source(&source(&[("AGENTNET_PORT", "http")])).is_err());
        assert!(NetworkConfig::from_source(&source(&[("AGENTNET_LIVENESS_PROBE", "ping")])).is_err());
        assert!(NetworkConfig::from_source(&source(&[("AGENTNET_SWEEP_ENABLED", "maybe")])).is_err());
        assert!(NetworkConfig::from_source(&source(&[("AGENTNET_HOST", "not a host")])).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = NetworkConfig::from_source(&source(&[("AGENTNET_PROBE_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("AGENTNET_PROBE_TIMEOUT_MS"));
    }

    #[test]
    fn test_zero_sweep_interval_allowed_when_disabled() {
        let config = NetworkConfig::from_source(&source(&[
            ("AGENTNET_SWEEP_ENABLED", "false"),
            ("AGENTNET_SWEEP_INTERVAL_SECS", "0"),
        ]));
        assert!(config.is_ok());
    }

    #[test]
    fn test_for_tests_is_valid() {
        assert!(NetworkConfig::for_tests().validate().is_ok());
    }
}
